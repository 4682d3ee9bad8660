use std::rc::Rc;

use smallvec::SmallVec;
use tether_reactive::Value;

use crate::{
    FxIndexMap,
    error::{Error, Result},
    parser::{Target, parse_target, split_arguments},
};

/// Transforms a bound value on its way to the binder (`read`) and, for
/// publishing binders, on its way back to the model (`publish`).
///
/// Any `Fn(Value, &[Value]) -> Value` closure is a read-only formatter.
pub trait Formatter {
    fn read(&self, value: Value, args: &[Value]) -> Value;

    fn publish(&self, value: Value, _args: &[Value]) -> Value {
        value
    }
}

impl<F> Formatter for F
where
    F: Fn(Value, &[Value]) -> Value,
{
    fn read(&self, value: Value, args: &[Value]) -> Value {
        self(value, args)
    }
}

#[derive(Clone, Default)]
pub struct FormatterRegistry(FxIndexMap<String, Rc<dyn Formatter>>);

impl FormatterRegistry {
    pub fn insert(&mut self, name: &str, formatter: impl Formatter + 'static) {
        self.0.insert(name.to_owned(), Rc::new(formatter));
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Formatter>> {
        self.0.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub(crate) fn fill_from(&mut self, other: &FormatterRegistry) {
        for (name, formatter) in &other.0 {
            if !self.0.contains_key(name) {
                self.0.insert(name.clone(), formatter.clone());
            }
        }
    }
}

/// One `name arg arg` stage of a formatter pipeline, resolved against the
/// registry when the binding is built. An unknown name resolves to `None`
/// and the stage passes its input through.
#[derive(Clone, educe::Educe)]
#[educe(Debug)]
pub(crate) struct FormatterCall {
    pub(crate) name: String,
    #[educe(Debug(ignore))]
    pub(crate) formatter: Option<Rc<dyn Formatter>>,
    pub(crate) args: SmallVec<[Target; 2]>,
}

impl FormatterCall {
    pub(crate) fn parse(declaration: &str, registry: &FormatterRegistry) -> Result<Self> {
        let mut parts = split_arguments(declaration)?.into_iter();
        let name = parts
            .next()
            .ok_or_else(|| Error::EmptyFormatter(declaration.to_owned()))?;
        let args = parts
            .map(|arg| parse_target(&arg))
            .collect::<Result<SmallVec<[Target; 2]>>>()?;
        Ok(Self {
            formatter: registry.get(&name),
            name,
            args,
        })
    }
}
