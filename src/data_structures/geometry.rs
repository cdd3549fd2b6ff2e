//! CPU-side triangle geometry and the primitive shapes dioramas are built from.
//!
//! Shapes are generated directly in their final orientation (ground planes
//! and ponds lie in the XZ plane facing +Y) so no extra node rotation is
//! needed to lay them flat.

use std::f32::consts::TAU;

#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    disposed: bool,
}

impl Geometry {
    pub fn new(
        name: impl Into<String>,
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        indices: Vec<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            positions,
            normals,
            indices,
            disposed: false,
        }
    }

    /// A square of side `size` centred at the origin in the XZ plane.
    pub fn plane(size: f32) -> Self {
        let h = size / 2.0;
        Self::new(
            "plane",
            vec![[-h, 0.0, h], [h, 0.0, h], [h, 0.0, -h], [-h, 0.0, -h]],
            vec![[0.0, 1.0, 0.0]; 4],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    /// A filled circle in the XZ plane.
    pub fn disc(radius: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let mut positions = vec![[0.0, 0.0, 0.0]];
        let mut indices = Vec::with_capacity(segments as usize * 3);
        for i in 0..segments {
            let angle = i as f32 / segments as f32 * TAU;
            positions.push([radius * angle.cos(), 0.0, -radius * angle.sin()]);
            let next = (i + 1) % segments;
            indices.extend_from_slice(&[0, i + 1, next + 1]);
        }
        let normals = vec![[0.0, 1.0, 0.0]; positions.len()];
        Self::new("disc", positions, normals, indices)
    }

    /// An axis-aligned box centred at the origin.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (x, y, z) = (width / 2.0, height / 2.0, depth / 2.0);
        // (normal, two in-plane axes) per face
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -z], [0.0, y, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, z], [0.0, y, 0.0]),
            ([0.0, 1.0, 0.0], [x, 0.0, 0.0], [0.0, 0.0, -z]),
            ([0.0, -1.0, 0.0], [x, 0.0, 0.0], [0.0, 0.0, z]),
            ([0.0, 0.0, 1.0], [x, 0.0, 0.0], [0.0, y, 0.0]),
            ([0.0, 0.0, -1.0], [-x, 0.0, 0.0], [0.0, y, 0.0]),
        ];
        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let centre = [normal[0] * x, normal[1] * y, normal[2] * z];
            let base = positions.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                positions.push([
                    centre[0] + su * u[0] + sv * v[0],
                    centre[1] + su * u[1] + sv * v[1],
                    centre[2] + su * u[2] + sv * v[2],
                ]);
                normals.push(normal);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new("box", positions, normals, indices)
    }

    /// An open-ended cylinder along the Y axis, centred at the origin.
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let h = height / 2.0;
        let mut positions = Vec::with_capacity(segments as usize * 2);
        let mut normals = Vec::with_capacity(segments as usize * 2);
        for i in 0..segments {
            let angle = i as f32 / segments as f32 * TAU;
            let (sin, cos) = angle.sin_cos();
            positions.push([radius_top * sin, h, radius_top * cos]);
            positions.push([radius_bottom * sin, -h, radius_bottom * cos]);
            normals.push([sin, 0.0, cos]);
            normals.push([sin, 0.0, cos]);
        }
        let mut indices = Vec::with_capacity(segments as usize * 6);
        for i in 0..segments {
            let top = i * 2;
            let bottom = top + 1;
            let next_top = ((i + 1) % segments) * 2;
            let next_bottom = next_top + 1;
            indices.extend_from_slice(&[top, bottom, next_bottom, top, next_bottom, next_top]);
        }
        Self::new("cylinder", positions, normals, indices)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /**
     * Releases the vertex data. Returns `false` if the geometry was already released.
     */
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.positions = Vec::new();
        self.normals = Vec::new();
        self.indices = Vec::new();
        self.disposed = true;
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
