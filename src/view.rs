use std::{cell::RefCell, cmp::Reverse, rc::Rc};

use smallvec::SmallVec;
use tether_reactive::Object;
use tracing::{debug, trace, warn};

use crate::{
    binder::Binder,
    binders::TextBinder,
    binding::Binding,
    node::{NodeId, NodeKind},
    options::ViewOptions,
    parser::{TemplateToken, parse_template},
    scope::Scope,
};

/// All bindings found in a set of root nodes, bound against one scope.
///
/// Building a view walks the nodes depth first, turns every
/// `<prefix>-<directive>` attribute into a [`Binding`] (removing the
/// attribute) and every interpolated text node into text bindings. The
/// bindings are then ordered by descending binder priority; bindings of
/// equal priority keep document order.
#[derive(Clone, Debug)]
pub struct View(Rc<ViewInner>);

#[derive(educe::Educe)]
#[educe(Debug)]
struct ViewInner {
    nodes: SmallVec<[NodeId; 1]>,
    scope: Scope,
    #[educe(Debug(ignore))]
    options: Rc<ViewOptions>,
    bindings: RefCell<Vec<Binding>>,
}

impl View {
    /// Builds the bindings for `nodes` without binding them.
    pub fn new(
        nodes: impl IntoIterator<Item = NodeId>,
        scope: Scope,
        options: Rc<ViewOptions>,
    ) -> Self {
        let view = View(Rc::new(ViewInner {
            nodes: nodes.into_iter().collect(),
            scope,
            options,
            bindings: RefCell::new(Vec::new()),
        }));
        view.build();
        view
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.0.nodes
    }

    pub fn first_node(&self) -> Option<NodeId> {
        self.0.nodes.first().copied()
    }

    pub fn scope(&self) -> &Scope {
        &self.0.scope
    }

    /// The models owned by this view's scope.
    pub fn models(&self) -> &Object {
        self.0.scope.models()
    }

    pub fn options(&self) -> &Rc<ViewOptions> {
        &self.0.options
    }

    /// The bindings in application order.
    pub fn bindings(&self) -> Vec<Binding> {
        self.0.bindings.borrow().clone()
    }

    pub fn bind(&self) {
        let bindings = self.bindings();
        debug!(bindings = bindings.len(), "binding view");
        for binding in bindings {
            binding.bind();
        }
    }

    /// Unbinds every binding, releasing all subscriptions held by this
    /// view and the views it created.
    pub fn unbind(&self) {
        let bindings = self.bindings();
        debug!(bindings = bindings.len(), "unbinding view");
        for binding in bindings {
            binding.unbind();
        }
    }

    /// Re-renders every binding from the current models.
    pub fn sync(&self) {
        for binding in self.bindings() {
            binding.sync();
        }
    }

    /// Pushes the node-side value of every publishing binding back into
    /// the models.
    pub fn publish(&self) {
        for binding in self.bindings() {
            if binding.binder().publishes() {
                binding.publish();
            }
        }
    }

    /// Assigns each property of `models` into this view's scope, then lets
    /// every binder react to the new models.
    pub fn update(&self, models: &Object) {
        let own = self.models();
        for key in models.keys() {
            own.set(&key, models.get(&key));
        }
        for binding in self.bindings() {
            binding.update(models);
        }
    }

    fn build(&self) {
        let mut bindings = Vec::new();
        for node in self.0.nodes.clone() {
            self.parse(node, &mut bindings);
        }
        bindings.sort_by_key(|binding| Reverse(binding.priority()));
        *self.0.bindings.borrow_mut() = bindings;
    }

    fn parse(&self, node: NodeId, bindings: &mut Vec<Binding>) {
        let block = match node.kind() {
            Some(NodeKind::Text) => {
                self.parse_text(node, bindings);
                true
            }
            Some(NodeKind::Element(_)) => self.traverse(node, bindings),
            _ => true,
        };
        if !block {
            for child in node.children() {
                self.parse(child, bindings);
            }
        }
    }

    /// Collects the directives of one element. Returns `true` when the
    /// element's children must not be traversed.
    fn traverse(&self, node: NodeId, bindings: &mut Vec<Binding>) -> bool {
        let prefix = self.0.options.options.full_prefix();
        let block = matches!(node.tag().as_deref(), Some("script" | "style"));

        let mut pending = Vec::new();
        for (attribute, declaration) in node.attributes() {
            let Some(directive) = attribute.strip_prefix(&prefix) else {
                continue;
            };
            let Some((binder, arg)) = self.0.options.binders.resolve(directive) else {
                debug!(directive, "no binder for directive, skipping");
                continue;
            };
            if binder.block() {
                self.build_binding(node, directive, binder, arg, &declaration, bindings);
                node.remove_attribute(&attribute);
                return true;
            }
            pending.push((attribute.clone(), directive.to_owned(), binder, arg, declaration));
        }

        for (attribute, directive, binder, arg, declaration) in pending {
            self.build_binding(node, &directive, binder, arg, &declaration, bindings);
            node.remove_attribute(&attribute);
        }
        block
    }

    /// Splits an interpolated text node into literal and bound text nodes.
    fn parse_text(&self, node: NodeId, bindings: &mut Vec<Binding>) {
        let Some((open, close)) = &self.0.options.options.template_delimiters else {
            return;
        };
        let Some(tokens) = parse_template(&node.text_content(), open, close) else {
            return;
        };
        let Some(parent) = node.parent() else {
            trace!("skipping interpolation in a detached text node");
            return;
        };
        let text_binder: Rc<dyn Binder> = Rc::new(TextBinder);
        for token in tokens {
            match token {
                TemplateToken::Text(text) => parent.insert_before(NodeId::text(&text), Some(node)),
                TemplateToken::Binding(declaration) => {
                    let text = NodeId::text(&declaration);
                    parent.insert_before(text, Some(node));
                    self.build_binding(
                        text,
                        "text",
                        text_binder.clone(),
                        None,
                        &declaration,
                        bindings,
                    );
                }
            }
        }
        node.remove();
    }

    fn build_binding(
        &self,
        node: NodeId,
        directive: &str,
        binder: Rc<dyn Binder>,
        arg: Option<String>,
        declaration: &str,
        bindings: &mut Vec<Binding>,
    ) {
        match Binding::new(
            self.0.options.clone(),
            self.0.scope.clone(),
            node,
            directive,
            binder,
            arg,
            declaration,
        ) {
            Ok(binding) => bindings.push(binding),
            Err(err) => warn!(%err, directive, "skipping malformed directive"),
        }
    }
}

/// Builds and binds a view over `nodes` with `models` as the root scope.
pub(crate) fn bind_nodes(
    nodes: impl IntoIterator<Item = NodeId>,
    models: Object,
    options: ViewOptions,
) -> View {
    let view = View::new(nodes, Scope::new(models), Rc::new(options));
    view.bind();
    view
}
