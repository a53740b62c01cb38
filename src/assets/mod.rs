/// Image asset module
///
/// This module handles:
/// - Writing uploaded customer photos to the content directory
/// - Generating inline thumbnails for map popups
/// - Reporting assets that no record references

pub mod store;
pub mod thumbnail;

pub use store::{AssetPath, ImageAssetStore, ThumbnailSource};
pub use thumbnail::{InlineImage, Thumbnail};
