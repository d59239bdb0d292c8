pub mod expectations;
pub mod scenes;

pub use expectations::{
    check_pixels, check_poses, check_visible_from, facing_viewer, PixelExpectation,
    PoseExpectation,
};
pub use scenes::{
    bifold_new_year, canonical_configurations, card_image_data_uri, closed_poses, open_poses,
    CANVAS_HEIGHT, CANVAS_WIDTH,
};
