mod asset_index;

pub use asset_index::{object_relative_path, AssetIndex, AssetObject};
