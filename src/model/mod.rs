//! The in-memory changelog graph handed to the host engine.

pub mod change;
pub mod changelog;
pub mod changeset;
pub mod column;
pub mod filter;
pub mod precondition;
pub mod value;

pub use change::Change;
pub use changelog::ChangeLog;
pub use changeset::{
    ChangeSet, ObjectQuotingStrategy, SqlVisitor, SqlVisitorAction, ValidationFailOption,
};
pub use column::{Column, ColumnValue, Constraints, DateValue};
pub use filter::{ContextExpression, LabelExpression, Labels};
pub use precondition::{FailOption, OutputOption, Precondition, PreconditionCheck, PreconditionContainer};
pub use value::Value;
