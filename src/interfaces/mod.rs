pub mod asset_source;
