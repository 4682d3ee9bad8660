use std::cell::RefCell;

use tether_reactive::{Adapter, PropertyAdapter};

use crate::{
    binder::{Binder, BinderRegistry},
    binders,
    formatter::{Formatter, FormatterRegistry},
    formatters,
    keypath::AdapterRegistry,
};

/// Scalar settings of a view.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct Options {
    /// Directive attributes are named `<prefix>-<directive>`.
    pub prefix: String,
    /// Delimiters of text interpolation. `None` disables interpolation.
    pub template_delimiters: Option<(String, String)>,
    /// Interface of the first keypath segment when none is written.
    pub root_interface: char,
    /// Whether bindings render once when bound instead of waiting for the
    /// first change.
    pub preload_data: bool,
    /// Scope name of the iteration index.
    pub index_property: String,
    /// Element attribute overriding [`Options::index_property`].
    pub index_attribute: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            prefix: "rv".to_owned(),
            template_delimiters: Some(("{".to_owned(), "}".to_owned())),
            root_interface: '.',
            preload_data: true,
            index_property: "$index".to_owned(),
            index_attribute: "index-property".to_owned(),
        }
    }
}

impl Options {
    pub fn full_prefix(&self) -> String {
        format!("{}-", self.prefix)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_template_delimiters(mut self, delimiters: Option<(&str, &str)>) -> Self {
        self.template_delimiters =
            delimiters.map(|(open, close)| (open.to_owned(), close.to_owned()));
        self
    }

    pub fn with_root_interface(mut self, interface: char) -> Self {
        self.root_interface = interface;
        self
    }

    pub fn with_preload_data(mut self, preload: bool) -> Self {
        self.preload_data = preload;
        self
    }

    pub fn with_index_property(mut self, name: impl Into<String>) -> Self {
        self.index_property = name.into();
        self
    }
}

/// Everything a view needs: settings plus the binder, formatter and
/// adapter registries.
#[derive(Clone)]
pub struct ViewOptions {
    pub options: Options,
    pub binders: BinderRegistry,
    pub formatters: FormatterRegistry,
    pub adapters: AdapterRegistry,
}

impl ViewOptions {
    /// Default settings with the stock binders, formatters and the
    /// structural adapter on the root interface.
    pub fn defaults() -> Self {
        let options = Options::default();
        let mut adapters = AdapterRegistry::default();
        adapters.insert(options.root_interface, PropertyAdapter);
        Self {
            options,
            binders: binders::stock(),
            formatters: formatters::stock(),
            adapters,
        }
    }
}

thread_local! {
    static DEFAULTS: RefCell<ViewOptions> = RefCell::new(ViewOptions::defaults());
}

/// Per-call overrides for [`bind`](crate::bind).
///
/// Settings left unset and registry entries not named here fall back to
/// the thread's defaults (see [`configure`]).
#[derive(Clone, Default)]
pub struct BindOptions {
    prefix: Option<String>,
    template_delimiters: Option<Option<(String, String)>>,
    root_interface: Option<char>,
    preload_data: Option<bool>,
    index_property: Option<String>,
    binders: BinderRegistry,
    formatters: FormatterRegistry,
    adapters: AdapterRegistry,
}

impl BindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn template_delimiters(mut self, delimiters: Option<(&str, &str)>) -> Self {
        self.template_delimiters =
            Some(delimiters.map(|(open, close)| (open.to_owned(), close.to_owned())));
        self
    }

    pub fn root_interface(mut self, interface: char) -> Self {
        self.root_interface = Some(interface);
        self
    }

    pub fn preload_data(mut self, preload: bool) -> Self {
        self.preload_data = Some(preload);
        self
    }

    pub fn index_property(mut self, name: impl Into<String>) -> Self {
        self.index_property = Some(name.into());
        self
    }

    pub fn binder(mut self, name: &str, binder: impl Binder + 'static) -> Self {
        self.binders.insert(name, binder);
        self
    }

    pub fn formatter(mut self, name: &str, formatter: impl Formatter + 'static) -> Self {
        self.formatters.insert(name, formatter);
        self
    }

    pub fn adapter(mut self, interface: char, adapter: impl Adapter + 'static) -> Self {
        self.adapters.insert(interface, adapter);
        self
    }

    /// Applies these overrides on top of `base`.
    pub(crate) fn merge_over(self, base: &ViewOptions) -> ViewOptions {
        let mut options = base.options.clone();
        if let Some(prefix) = self.prefix {
            options.prefix = prefix;
        }
        if let Some(delimiters) = self.template_delimiters {
            options.template_delimiters = delimiters;
        }
        if let Some(interface) = self.root_interface {
            options.root_interface = interface;
        }
        if let Some(preload) = self.preload_data {
            options.preload_data = preload;
        }
        if let Some(index_property) = self.index_property {
            options.index_property = index_property;
        }

        let mut binders = self.binders;
        binders.fill_from(&base.binders);
        let mut formatters = self.formatters;
        formatters.fill_from(&base.formatters);
        let mut adapters = self.adapters;
        adapters.fill_from(&base.adapters);

        ViewOptions {
            options,
            binders,
            formatters,
            adapters,
        }
    }
}

/// Changes this thread's defaults for every later [`bind`](crate::bind).
///
/// Settings given in `overrides` replace the current defaults; binders,
/// formatters and adapters are added, replacing any with the same name.
pub fn configure(overrides: BindOptions) {
    DEFAULTS.with_borrow_mut(|defaults| {
        *defaults = overrides.merge_over(defaults);
    });
}

/// Restores this thread's defaults to [`ViewOptions::defaults`].
pub fn reset_defaults() {
    DEFAULTS.with_borrow_mut(|defaults| *defaults = ViewOptions::defaults());
}

pub(crate) fn resolve(overrides: BindOptions) -> ViewOptions {
    DEFAULTS.with_borrow(|defaults| overrides.merge_over(defaults))
}
