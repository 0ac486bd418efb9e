mod catalog;
mod targets;

pub use catalog::{
    ImageQuality, ImageSize, ImageStyle, ModelOptions, ModelOptionsCatalog, ResponseFormat,
    VendorContext,
};
pub use targets::{parse_deployments, DeploymentParse, ModelTarget, ModelTargets};
