//! Built-in management commands.

pub mod createsuperuser;
pub mod migrate;
pub mod runserver;

pub use createsuperuser::CreatesuperuserCommand;
pub use migrate::MigrateCommand;
pub use runserver::RunserverCommand;

use crate::command::CommandRegistry;

/// Registers every built-in command.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(MigrateCommand));
    registry.register(Box::new(RunserverCommand));
    registry.register(Box::new(CreatesuperuserCommand));
}

/// A registry holding the built-in commands.
pub fn builtin_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);
    registry
}
