/// Expands to a `caps()` implementation for a [`crate::function::Function`].
///
/// ```ignore
/// impl Function for AbsFn {
///     func_caps!(PURE, ELEMENTWISE);
///     ...
/// }
/// ```
#[macro_export]
macro_rules! func_caps {
    ( $($cap:ident),* $(,)? ) => {
        fn caps(&self) -> $crate::function::FnCaps {
            $crate::function::FnCaps::empty() $( .union($crate::function::FnCaps::$cap) )*
        }
    };
}

#[macro_export]
macro_rules! register_functions {
    ( $registry:expr; $($fn:expr),+ $(,)? ) => {{
        use std::sync::Arc;
        $(
            $registry.register(Arc::new($fn));
        )+
    }};
}
