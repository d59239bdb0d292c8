use crate::expectations::PoseExpectation;
use base64::{engine::general_purpose::STANDARD, Engine};
use foldcard::{CardConfiguration, CardFormat, ImageSource, PanelKind, Theme};
use std::io::Cursor;

pub const CANVAS_WIDTH: u32 = 320;
pub const CANVAS_HEIGHT: u32 = 240;

/// A solid-color PNG wrapped in a `data:` URI, the way card images reach the preview.
pub fn card_image_data_uri(width: u32, height: u32, rgba: [u8; 4]) -> String {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encoding a PNG into memory cannot fail");
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

/// The reference scenario: a New Year bifold with the default message.
pub fn bifold_new_year() -> CardConfiguration {
    CardConfiguration::new(
        ImageSource::data_uri(card_image_data_uri(8, 10, [200, 40, 40, 255])),
        Theme::NewYear,
        CardFormat::Bifold,
    )
}

/// Every theme and format, labelled `theme/format`.
pub fn canonical_configurations() -> Vec<(String, CardConfiguration)> {
    let image = ImageSource::data_uri(card_image_data_uri(4, 4, [255, 255, 255, 255]));
    Theme::ALL
        .iter()
        .flat_map(|theme| {
            let image = image.clone();
            CardFormat::ALL.iter().map(move |format| {
                (
                    format!("{theme}/{format}"),
                    CardConfiguration::new(image.clone(), *theme, *format),
                )
            })
        })
        .collect()
}

fn four_faces(
    label: &'static str,
    front: [f32; 3],
    inside_left: [f32; 3],
    inside_right: [f32; 3],
    back: [f32; 3],
) -> Vec<PoseExpectation> {
    vec![
        PoseExpectation::facing(label, PanelKind::FrontCover, front),
        PoseExpectation::facing(label, PanelKind::InsideLeft, inside_left),
        PoseExpectation::facing(label, PanelKind::InsideRight, inside_right),
        PoseExpectation::facing(label, PanelKind::BackCover, back),
    ]
}

/// Panel orientations of a card at rest, closed: the image toward the viewer.
pub fn closed_poses(format: CardFormat) -> Vec<PoseExpectation> {
    match format {
        CardFormat::Single => vec![PoseExpectation::facing(
            "closed",
            PanelKind::FrontCover,
            [0.0, 0.0, 1.0],
        )],
        CardFormat::Bifold | CardFormat::Quadfold => four_faces(
            "closed",
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ),
    }
}

/// Panel orientations once the fold has settled open.
///
/// A bifold swings its front leaf round to the left (153°) and leaves the greeting page
/// square to the viewer. A quadfold opens into a V whose two inside pages are each turned
/// 18° off the view axis.
pub fn open_poses(format: CardFormat) -> Vec<PoseExpectation> {
    match format {
        CardFormat::Single => closed_poses(format),
        CardFormat::Bifold => four_faces(
            "open",
            [-0.454, 0.0, -0.891],
            [0.454, 0.0, 0.891],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ),
        CardFormat::Quadfold => four_faces(
            "open",
            [-0.309, 0.0, -0.951],
            [0.309, 0.0, 0.951],
            [-0.309, 0.0, 0.951],
            [0.309, 0.0, -0.951],
        ),
    }
}
