use std::fmt::Display;

use serenity::{
    builder::{CreateApplicationCommand, CreateApplicationCommandOption, CreateApplicationCommands},
    model::application::command::CommandOptionType,
};

/// The component declaration trait.
///
/// Declares the root slash commands of a component.
/// A component that only handles events keeps the default implementation.
pub trait ComponentDeclarative {
    fn declarative(&self) -> Option<&'static Node> {
        None
    }
}

/// Commands declared by a component.
///
/// `commands` should be declared `static` in the component module.
pub struct Node {
    pub commands: &'static [Command]
}
impl Node {
    pub fn add_application_command(&self, commands: &mut CreateApplicationCommands) {
        for command in self.commands {
            commands.add_application_command(command.into());
        }
    }
    /// Find a declared command by name.
    pub fn find(&self, name: &str) -> Option<&'static Command> {
        self.commands.iter().find(|cmd| cmd.name == name)
    }
}

/// Command description data
pub struct Command {
    /// The name of the command.
    pub name: &'static str,
    /// The command description.
    pub description: &'static str,
    /// The command arguments. Can be empty.
    pub args: &'static [Argument],
}

impl From<&Command> for CreateApplicationCommand {
    fn from(command: &Command) -> Self {
        let mut app_cmd = CreateApplicationCommand::default();
        app_cmd
            .name(command.name)
            .description(command.description);
        for arg in command.args {
            app_cmd.add_option(arg.into());
        }
        app_cmd
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{} : {}", self.name, self.description)?;
        for arg in self.args {
            write!(f, " [{}]", arg)?;
        }
        Ok(())
    }
}

/// Argument description data
pub struct Argument {
    /// The name of the argument.
    pub name: &'static str,
    /// The argument type.
    pub type_: CommandOptionType,
    /// The argument description.
    pub description: &'static str,
    /// Whether the argument is optional to the command.
    pub optional: bool,
}
impl From<&Argument> for CreateApplicationCommandOption {
    fn from(argument: &Argument) -> Self {
        let mut app_cmd = CreateApplicationCommandOption::default();
        app_cmd
            .kind(argument.type_)
            .name(argument.name)
            .required(!argument.optional)
            .description(argument.description);
        app_cmd
    }
}

impl Display for Argument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let opt_str = if self.optional { "?" } else { "" };
        write!(f, "{}{}", self.name, opt_str)
    }
}
