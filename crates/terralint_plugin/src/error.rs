use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("rule {name:?} is provided by both {first:?} and {second:?}")]
    DuplicateRuleName {
        name: String,
        first: String,
        second: String,
    },

    #[error("config references unknown rule {name:?}")]
    UnknownRule { name: String },

    #[error("ruleset {ruleset:?} rejected its configuration: {message}")]
    Config { ruleset: String, message: String },
}
