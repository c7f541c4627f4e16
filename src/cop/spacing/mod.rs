pub mod comma_spacing;
pub mod list_context;

use super::registry::CopRegistry;

pub fn register_all(registry: &mut CopRegistry) {
    registry.register(Box::new(comma_spacing::CommaSpacing));
}
