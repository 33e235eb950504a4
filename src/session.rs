//! Per-container rendering state and delegated event dispatch.
//!
//! One [`RenderSession`] owns everything the runtime keeps per root
//! container: the backend handle, the current update callback, and the
//! once-only delegated listener installation. Nothing is stashed on the
//! live tree itself.

use tracing::debug;

use crate::apply::{apply, materialize};
use crate::backend::{EventKind, HostBackend};
use crate::diff::diff;
use crate::error::TreeError;
use crate::vnode::{NodeId, VTree, Value};

/// The application's update callback, invoked with the fully transformed
/// value of each dispatched event.
pub type UpdateFn = Box<dyn FnMut(Value)>;

/// Rendering state for one root container.
///
/// Full diff+apply cycles must be serialized per container, and a
/// dispatched update must not re-enter a render for the same container;
/// schedule follow-up renders after dispatch returns.
pub struct RenderSession<B: HostBackend> {
    backend: B,
    container: B::Node,
    update: Option<UpdateFn>,
    listeners_installed: bool,
}

impl<B: HostBackend> RenderSession<B> {
    pub fn new(backend: B, container: B::Node) -> Self {
        Self {
            backend,
            container,
            update: None,
            listeners_installed: false,
        }
    }

    pub fn container(&self) -> B::Node {
        self.container
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Clear the container, materialize `root` into it, install the
    /// delegated listeners (once), and set the update callback.
    pub fn full_render(
        &mut self,
        tree: &mut VTree,
        root: NodeId,
        update: impl FnMut(Value) + 'static,
    ) -> Result<(), TreeError> {
        while self.backend.child_count(self.container)? > 0 {
            self.backend.remove_last_child(self.container)?;
        }
        let concrete = materialize(tree, &mut self.backend, root)?;
        self.install_listeners()?;
        self.update = Some(Box::new(update));
        self.backend.append_child(self.container, concrete)?;
        debug!("full render into container");
        Ok(())
    }

    /// Diff `old` against `new`, apply the program if it is non-empty, and
    /// refresh the update callback.
    pub fn diff_render(
        &mut self,
        tree: &mut VTree,
        old: NodeId,
        new: NodeId,
        update: impl FnMut(Value) + 'static,
    ) -> Result<(), TreeError> {
        let patches = diff(tree, old, new)?;
        debug!(patches = patches.len(), "diff render");
        if !patches.is_empty() {
            apply(tree, &mut self.backend, self.container, &patches)?;
        }
        self.install_listeners()?;
        self.update = Some(Box::new(update));
        Ok(())
    }

    /// Route a host input event into the application.
    ///
    /// Walks from the originating element up through its ancestors
    /// (inclusive) to the nearest node carrying a descriptor for `kind`,
    /// resolves the raw value (the descriptor's explicit value, else the
    /// originating control's state), applies the handler chain, and
    /// invokes the update callback. No matching ancestor and no registered
    /// callback are both silent no-ops.
    pub fn dispatch(&mut self, kind: EventKind, target: B::Node) {
        let mut cursor = Some(target);
        let descriptor = loop {
            let Some(node) = cursor else {
                debug!(kind = %kind, "no ancestor carries a handler, dropping event");
                return;
            };
            if let Some(descriptor) = self.backend.event_descriptor(node, kind) {
                break descriptor;
            }
            cursor = self.backend.parent(node);
        };

        let mut value = match &descriptor.value {
            Some(explicit) => explicit.clone(),
            None => self.backend.target_value(target),
        };
        for stage in &descriptor.chain {
            value = stage(value);
        }

        match self.update.as_mut() {
            Some(update) => update(value),
            None => debug!(kind = %kind, "no update callback registered, dropping event"),
        }
    }

    fn install_listeners(&mut self) -> Result<(), TreeError> {
        if self.listeners_installed {
            return Ok(());
        }
        for kind in EventKind::ALL {
            self.backend.subscribe_delegated(self.container, kind)?;
        }
        self.listeners_installed = true;
        debug!("delegated listeners installed");
        Ok(())
    }
}
