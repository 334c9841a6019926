//! Hook registration.

use super::builtin::{BuildInfoHook, ChannelOverlayHook, FanoutHook};
use super::{PostBuildHook, PreBuildHook};
use crate::bundler::error::{Error, Result};

/// Orders owned by the pipeline's built-in steps.
pub const RESERVED_ORDERS: [u8; 3] = [0, 50, 100];

/// Highest order a hook may use.
const MAX_ORDER: u8 = 100;

struct Registration<H: ?Sized> {
    order: u8,
    hook: Box<H>,
}

/// Registered pre- and post-build hooks.
///
/// Hooks run by ascending order; equal orders keep registration order.
#[derive(Default)]
pub struct HookRegistry {
    pre: Vec<Registration<dyn PreBuildHook>>,
    post: Vec<Registration<dyn PostBuildHook>>,
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("pre", &self.pre_hooks().map(|(o, h)| (o, h.name())).collect::<Vec<_>>())
            .field("post", &self.post_hooks().map(|(o, h)| (o, h.name())).collect::<Vec<_>>())
            .finish()
    }
}

fn check_order(order: u8) -> Result<()> {
    if order > MAX_ORDER || RESERVED_ORDERS.contains(&order) {
        return Err(Error::ReservedHookOrder { order });
    }
    Ok(())
}

impl HookRegistry {
    /// Empty registry. A pipeline over it fails with [`Error::NoHook`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in hooks at their reserved slots.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert_pre(0, Box::new(ChannelOverlayHook));
        registry.insert_pre(50, Box::new(BuildInfoHook));
        registry.insert_post(50, Box::new(FanoutHook));
        registry
    }

    /// Registers a pre-build hook.
    ///
    /// # Errors
    ///
    /// [`Error::ReservedHookOrder`] for orders 0, 50, 100 or above 100.
    pub fn register_pre<H: PreBuildHook + 'static>(&mut self, order: u8, hook: H) -> Result<()> {
        check_order(order)?;
        self.insert_pre(order, Box::new(hook));
        Ok(())
    }

    /// Registers a post-build hook.
    ///
    /// # Errors
    ///
    /// [`Error::ReservedHookOrder`] for orders 0, 50, 100 or above 100.
    pub fn register_post<H: PostBuildHook + 'static>(&mut self, order: u8, hook: H) -> Result<()> {
        check_order(order)?;
        self.insert_post(order, Box::new(hook));
        Ok(())
    }

    fn insert_pre(&mut self, order: u8, hook: Box<dyn PreBuildHook>) {
        self.pre.push(Registration { order, hook });
        self.pre.sort_by_key(|r| r.order);
    }

    fn insert_post(&mut self, order: u8, hook: Box<dyn PostBuildHook>) {
        self.post.push(Registration { order, hook });
        self.post.sort_by_key(|r| r.order);
    }

    /// Pre-build hooks in run order.
    pub fn pre_hooks(&self) -> impl Iterator<Item = (u8, &dyn PreBuildHook)> {
        self.pre.iter().map(|r| (r.order, r.hook.as_ref()))
    }

    /// Post-build hooks in run order.
    pub fn post_hooks(&self) -> impl Iterator<Item = (u8, &dyn PostBuildHook)> {
        self.post.iter().map(|r| (r.order, r.hook.as_ref()))
    }

    /// Number of pre-build hooks.
    pub fn pre_len(&self) -> usize {
        self.pre.len()
    }

    /// Number of post-build hooks.
    pub fn post_len(&self) -> usize {
        self.post.len()
    }
}
