/// A circular coin candidate, in pixel units of the image it was found in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedCircle {
    pub center_x: f32,
    pub center_y: f32,
    pub radius: f32,
}

impl DetectedCircle {
    pub fn new(center_x: f32, center_y: f32, radius: f32) -> Self {
        Self { center_x, center_y, radius }
    }

    /// Uniform scale of center and radius
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            center_x: self.center_x * factor,
            center_y: self.center_y * factor,
            radius: self.radius * factor,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

/// Circles found in one image. The number of circles is the coin count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CircleSet {
    circles: Vec<DetectedCircle>,
}

impl CircleSet {
    pub fn new(circles: Vec<DetectedCircle>) -> Self {
        Self { circles }
    }

    pub fn count(&self) -> u32 {
        self.circles.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DetectedCircle> {
        self.circles.iter()
    }

    pub fn as_slice(&self) -> &[DetectedCircle] {
        &self.circles
    }

    /// Map every circle back to another image scale
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            circles: self.circles.iter().map(|c| c.scaled(factor)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CircleSet {
    type Item = &'a DetectedCircle;
    type IntoIter = std::slice::Iter<'a, DetectedCircle>;

    fn into_iter(self) -> Self::IntoIter {
        self.circles.iter()
    }
}
