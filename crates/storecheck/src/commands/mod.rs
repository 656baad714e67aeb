mod compare;
mod init;
mod list;
mod run;

pub use self::compare::compare;
pub use self::init::init;
pub use self::list::list;
pub use self::run::run;
