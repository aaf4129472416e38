pub mod actions;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod mount;
pub mod normalize;
pub mod parser;
pub mod persistence;
pub mod reducer;
pub mod selection;
pub mod state;
pub mod step;
pub mod tree;
pub mod workspace;

pub use actions::*;
pub use reducer::*;
pub use state::*;

pub use config::Config;
pub use diagnostics::Diagnostic;
pub use diagnostics::DiagnosticCode;
pub use diagnostics::DiagnosticLevel;
pub use error::*;
pub use extract::Action;
pub use extract::ExtractorLimits;
pub use mount::MountEntry;
pub use mount::MountTree;
pub use parser::extract_raw_actions;
pub use parser::parse_actions_to_steps;
pub use parser::ParseOutcome;
pub use parser::Parser;
pub use persistence::*;
pub use step::Step;
pub use step::StepKind;
pub use step::StepStatus;
pub use tree::FileNode;
pub use workspace::Workspace;
