mod difficulty;
mod length;
mod map;
mod mod_entry;
mod publisher;
mod rating;
mod setup;
mod tech;
mod token;
mod user;

pub use difficulty::{Difficulty, DifficultyId, DifficultyWithChildren};
pub use length::{LengthId, MapLength};
pub use map::{
    MapCreation, MapDetailsCreation, MapId, MapTechCreation, MapTechRef, RawMap, RawMapDetails,
};
pub use mod_entry::{ModCreation, ModId, ModType, RawMod, RawModDetails};
pub use publisher::{Publisher, PublisherConnection, PublisherId, PublisherQuery};
pub use rating::{Rating, RatingSummary};
pub use tech::{Tech, TechId, TechWithDifficulty};
pub use user::{User, UserId};

pub(crate) use difficulty::insert_difficulty_tree;
