//! # kiln-output
//!
//! Turns graph modules into final module code.
//!
//! Every module gets a numeric id from a [`ModuleIdTable`]. The ids of the
//! module and of its dependencies are written into its code by an
//! [`IdEmbedder`]:
//!
//! - [`WrapperCallEmbedder`] appends them as extra arguments of the module's
//!   define call;
//! - [`InlineIdEmbedder`] replaces dependency-map references such as
//!   `_dependencyMap[2]` with literal ids, by text splicing when a reserved
//!   placeholder name is configured and by an oxc AST rewrite otherwise.
//!
//! [`module_code_and_map`] ties it together and also attaches function maps to
//! the module's source map.
//!
//! ## Example
//!
//! ```rust
//! use std::path::Path;
//! use kiln_output::{ModuleIdTable, OutputModule, WrapperCallEmbedder, module_code_and_map};
//!
//! let mut ids = ModuleIdTable::new();
//! let module = OutputModule::new(Path::new("/app/index.js"), "__d(function() {});")
//!     .with_dependencies(vec![Path::new("/app/util.js")]);
//!
//! let out = module_code_and_map(&module, &mut ids, &WrapperCallEmbedder)?;
//! assert_eq!(out.code, "__d(function() {},0,[1]);");
//! # Ok::<(), kiln_output::OutputError>(())
//! ```

pub mod embed;
pub mod error;
pub mod ids;
pub mod inline;
pub mod module;
pub mod output;
pub mod scripts;
pub mod source_map;
pub mod wrapper;

pub use embed::{IdEmbedder, IdEmbedding, OutputOptions};
pub use error::{OutputError, Result};
pub use ids::{ModuleIdAllocator, ModuleIdTable};
pub use inline::InlineIdEmbedder;
pub use module::{Embedded, OutputModule};
pub use output::module_code_and_map;
pub use scripts::{VirtualScript, append_scripts, partition, require_calls_to};
pub use source_map::{attach_function_map, merge_source_maps};
pub use wrapper::{WrapperCallEmbedder, add_params_to_define_call};
