pub mod errors;
pub mod path_transform;
pub mod site;
pub mod site_config;
