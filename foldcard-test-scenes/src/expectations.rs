use foldcard::{CardAssembly, Color, PanelKind, Point3, Vec3};

/// A single pixel-color expectation to validate after rendering.
pub struct PixelExpectation {
    pub x: u32,
    pub y: u32,
    pub expected: Color,
    /// Per-channel tolerance for comparison (default 3).
    pub tolerance: u8,
    /// Human-readable label for failure messages.
    pub label: &'static str,
}

impl PixelExpectation {
    pub fn new(x: u32, y: u32, expected: Color, label: &'static str) -> Self {
        Self {
            x,
            y,
            expected,
            tolerance: 3,
            label,
        }
    }

    pub fn with_tolerance(mut self, tolerance: u8) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Validates pixel expectations against raw BGRA8 pixel data from `render_to_buffer()`.
///
/// Returns a list of human-readable failure descriptions. An empty list means
/// all expectations passed.
pub fn check_pixels(
    pixel_data: &[u8],
    width: u32,
    height: u32,
    expectations: &[PixelExpectation],
) -> Vec<String> {
    let mut failures = Vec::new();
    let stride = (width as usize) * 4;

    for expectation in expectations {
        if expectation.x >= width || expectation.y >= height {
            failures.push(format!(
                "[{}] pixel ({},{}) is outside canvas {}×{}",
                expectation.label, expectation.x, expectation.y, width, height,
            ));
            continue;
        }

        let offset = (expectation.y as usize) * stride + (expectation.x as usize) * 4;
        if offset + 4 > pixel_data.len() {
            failures.push(format!(
                "[{}] pixel ({},{}) is out of bounds (buffer len {})",
                expectation.label,
                expectation.x,
                expectation.y,
                pixel_data.len(),
            ));
            continue;
        }

        // render_to_buffer returns BGRA8
        let actual = [
            pixel_data[offset + 2],
            pixel_data[offset + 1],
            pixel_data[offset],
            pixel_data[offset + 3],
        ];
        let expected = expectation.expected.to_array();
        let tolerance = expectation.tolerance as i16;
        let matches = actual
            .iter()
            .zip(expected.iter())
            .all(|(actual, expected)| channel_matches(*actual, *expected, tolerance));

        if !matches {
            failures.push(format!(
                "[{}] pixel ({},{}) expected rgba{:?} ±{} but got rgba{:?}",
                expectation.label,
                expectation.x,
                expectation.y,
                expected,
                expectation.tolerance,
                actual,
            ));
        }
    }

    failures
}

fn channel_matches(actual: u8, expected: u8, tolerance: i16) -> bool {
    let diff = (actual as i16) - (expected as i16);
    diff.abs() <= tolerance
}

/// Where a panel's printed face should point in world space.
#[derive(Debug, Clone, Copy)]
pub struct PoseExpectation {
    pub label: &'static str,
    pub panel: PanelKind,
    /// Unit vector the panel's local +Z should map to.
    pub normal: [f32; 3],
    /// Minimum cosine between the expected and the actual direction.
    pub min_alignment: f32,
}

impl PoseExpectation {
    pub fn facing(label: &'static str, panel: PanelKind, normal: [f32; 3]) -> Self {
        Self {
            label,
            panel,
            normal,
            min_alignment: 0.95,
        }
    }

    pub fn with_min_alignment(mut self, min_alignment: f32) -> Self {
        self.min_alignment = min_alignment;
        self
    }
}

/// World-space centre and unit normal of a panel's printed face.
fn panel_frame(assembly: &CardAssembly, panel: PanelKind) -> Option<(Point3, Vec3)> {
    let node = assembly.panel(panel)?;
    let world = assembly.scene().world_transform(node)?;
    let origin = world.transform_point3d(Point3::origin())?;
    let tip = world.transform_point3d(Point3::new(0.0, 0.0, 1.0))?;
    Some((origin, (tip - origin).normalize()))
}

/// Cosine between a panel's face normal and the direction from the panel to `eye`.
/// Positive means the viewer sees the printed side.
pub fn facing_viewer(assembly: &CardAssembly, panel: PanelKind, eye: Point3) -> Option<f32> {
    let (origin, normal) = panel_frame(assembly, panel)?;
    Some(normal.dot((eye - origin).normalize()))
}

/// Checks that every panel in `panels` shows its printed side to a viewer at `eye`, with
/// at least `min_cosine` between face normal and view direction.
pub fn check_visible_from(
    assembly: &CardAssembly,
    eye: Point3,
    panels: &[PanelKind],
    min_cosine: f32,
) -> Vec<String> {
    panels
        .iter()
        .filter_map(|panel| match facing_viewer(assembly, *panel, eye) {
            None => Some(format!("{panel:?} is missing from the card")),
            Some(cosine) if cosine < min_cosine => Some(format!(
                "{panel:?} is turned away from the viewer at ({:.2}, {:.2}, {:.2}): cosine {cosine:.3} < {min_cosine}",
                eye.x, eye.y, eye.z
            )),
            Some(_) => None,
        })
        .collect()
}

/// Checks panel orientations of `assembly` in its current pose.
///
/// Returns a list of human-readable failure descriptions. An empty list means
/// all expectations passed.
pub fn check_poses(assembly: &CardAssembly, expectations: &[PoseExpectation]) -> Vec<String> {
    let mut failures = Vec::new();

    for expectation in expectations {
        let Some((_, actual)) = panel_frame(assembly, expectation.panel) else {
            failures.push(format!(
                "[{}] {:?} has no resolvable world transform",
                expectation.label, expectation.panel
            ));
            continue;
        };
        let [x, y, z] = expectation.normal;
        let alignment = actual.dot(Vec3::new(x, y, z).normalize());

        if alignment < expectation.min_alignment {
            failures.push(format!(
                "[{}] {:?} faces ({:.3}, {:.3}, {:.3}), expected ({x:.3}, {y:.3}, {z:.3}) (alignment {alignment:.3} < {})",
                expectation.label,
                expectation.panel,
                actual.x,
                actual.y,
                actual.z,
                expectation.min_alignment,
            ));
        }
    }

    failures
}
