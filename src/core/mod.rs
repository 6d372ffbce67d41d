pub mod chain;
pub mod dispatcher;
pub mod error;
pub mod params;
pub mod path_finder;
pub mod pattern;
pub mod route;
pub mod router;
pub mod table;

pub use dispatcher::{DispatchStage, Dispatcher, DispatcherBuilder, Next};
pub use error::{ConfigError, DispatchError, LookupError, RouteError};
pub use params::{ParamValue, Params};
pub use path_finder::{PathFinder, RouteMatch};
pub use pattern::{CompiledPattern, PatternCompiler};
pub use route::{HandlerRef, HandlerTarget, MatchedRoute, MiddlewareRef, Reference};
pub use router::{Router, RouterBuilder};
pub use table::RouteTable;
