//! Compilation passes.

mod layout;
mod preprocess;
mod routing;
mod unroll;

pub use layout::{
    BackpropagationLayout, CustomLayout, RandomLayout, SubgraphLayout, TrivialLayout,
};
pub use preprocess::Preprocessing;
pub use routing::{ShortestPathsRouter, respect_connectivity};
pub use unroll::NativeUnroller;
