pub mod aggregate;
pub mod numeric;
pub mod subtotal;

use crate::function_registry::FunctionRegistry;

pub fn register_builtins(registry: &mut FunctionRegistry) {
    aggregate::register_builtins(registry);
    numeric::register_builtins(registry);
    subtotal::register_builtins(registry);
}
