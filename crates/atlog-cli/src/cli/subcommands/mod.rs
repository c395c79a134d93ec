mod rules;

pub use rules::RulesCommands;
