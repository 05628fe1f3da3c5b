//! Gradient boosted decision tree inference
//!
//! Models are exported from the training pipeline as JSON:
//!
//! ```json
//! {
//!   "version": 1,
//!   "init_score": -2.1,
//!   "trees": [
//!     {
//!       "nodes": [
//!         {"left":1,"right":2,"feature":81,"threshold":0.42,"leaf":null},
//!         {"left":-1,"right":-1,"feature":-1,"leaf":-0.03},
//!         {"left":-1,"right":-1,"feature":-1,"leaf":0.05}
//!       ],
//!       "weight": 1.0
//!     }
//!   ]
//! }
//! ```
//!
//! Thresholds apply to standardized features, i.e. after the scaler ran.

pub mod model;
pub mod tree;

pub use model::GbdtModel;
pub use tree::{Node, Tree};
