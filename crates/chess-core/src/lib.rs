pub mod classification;
pub mod engine_line;
pub mod error;
pub mod evaluation;
pub mod game_data;
pub mod pgn;
pub mod tree;

pub use classification::Classification;
pub use engine_line::{EngineLine, LineMove};
pub use error::TreeError;
pub use evaluation::Evaluation;
pub use game_data::{Game, GameMetadata};
pub use tree::{GameTree, NodeId, NodeState, PlayedMove, TreeNode};
