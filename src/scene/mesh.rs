//! Triangle meshes.

use crate::util::{barycentric_lerp, Color4, Vec2, Vec3};

/// Alpha semantics of a mesh during intersection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MeshType {
    /// Fully opaque, backfaces culled.
    #[default]
    Opaque,
    /// Continuous alpha from the diffuse texture.
    Transparent,
    /// Alpha-tested with a hard 0.5 cutoff.
    Punch,
    /// Engine-specific geometry (water, decals); lit like opaque, double sided.
    Special,
}

/// Alpha cutoff for punch-through geometry.
pub const PUNCH_CUTOFF: f32 = 0.5;

/// Mesh vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub binormal: Vec3,
    /// Material texture coordinates.
    pub uv: Vec2,
    /// Lightmap atlas coordinates.
    pub lightmap_uv: Vec2,
    pub color: Color4,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            normal: Vec3::Z,
            tangent: Vec3::X,
            binormal: Vec3::Y,
            uv: Vec2::ZERO,
            lightmap_uv: Vec2::ZERO,
            color: Color4::ONE,
        }
    }
}

impl Vertex {
    /// Vertex at `position` with the given normal and a derived tangent frame.
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        let normal = normal.normalize_or_zero();
        let (tangent, binormal) = if normal == Vec3::ZERO {
            (Vec3::X, Vec3::Y)
        } else {
            normal.any_orthonormal_pair()
        };
        Self {
            position,
            normal,
            tangent,
            binormal,
            uv,
            lightmap_uv: uv,
            ..Default::default()
        }
    }
}

/// Triangle as three vertex indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triangle {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Triangle {
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }
}

/// Triangle mesh with an optional material (index into [`super::Scene::materials`]).
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    pub material: Option<usize>,
    pub mesh_type: MeshType,
}

impl Mesh {
    /// The three vertices of triangle `prim`.
    #[inline]
    pub fn triangle_vertices(&self, prim: u32) -> [&Vertex; 3] {
        let t = &self.triangles[prim as usize];
        [
            &self.vertices[t.a as usize],
            &self.vertices[t.b as usize],
            &self.vertices[t.c as usize],
        ]
    }

    /// Interpolated attributes at barycentrics `bary` on triangle `prim`.
    pub fn interpolate(&self, prim: u32, bary: Vec2) -> SurfaceAttributes {
        let [a, b, c] = self.triangle_vertices(prim);
        SurfaceAttributes {
            position: barycentric_lerp(a.position, b.position, c.position, bary),
            normal: barycentric_lerp(a.normal, b.normal, c.normal, bary).normalize_or_zero(),
            uv: barycentric_lerp(a.uv, b.uv, c.uv, bary),
            color: barycentric_lerp(a.color, b.color, c.color, bary),
        }
    }

    /// Texture UV at barycentrics `bary` on triangle `prim`.
    #[inline]
    pub fn uv_at(&self, prim: u32, bary: Vec2) -> Vec2 {
        let [a, b, c] = self.triangle_vertices(prim);
        barycentric_lerp(a.uv, b.uv, c.uv, bary)
    }

    /// Position at barycentrics `bary` on triangle `prim`.
    #[inline]
    pub fn position_at(&self, prim: u32, bary: Vec2) -> Vec3 {
        let [a, b, c] = self.triangle_vertices(prim);
        barycentric_lerp(a.position, b.position, c.position, bary)
    }

    /// Axis-aligned quad made of two triangles, counter-clockwise seen from `normal`.
    ///
    /// `center` is the quad centre, `u_axis`/`v_axis` its half extents.
    pub fn quad(name: impl Into<String>, center: Vec3, u_axis: Vec3, v_axis: Vec3) -> Self {
        let normal = u_axis.cross(v_axis).normalize_or_zero();
        let corners = [
            (center - u_axis - v_axis, Vec2::new(0.0, 0.0)),
            (center + u_axis - v_axis, Vec2::new(1.0, 0.0)),
            (center + u_axis + v_axis, Vec2::new(1.0, 1.0)),
            (center - u_axis + v_axis, Vec2::new(0.0, 1.0)),
        ];
        let vertices = corners
            .iter()
            .map(|&(p, uv)| {
                let mut v = Vertex::new(p, normal, uv);
                v.tangent = u_axis.normalize_or_zero();
                v.binormal = v_axis.normalize_or_zero();
                v
            })
            .collect();

        Self {
            name: name.into(),
            vertices,
            triangles: vec![Triangle::new(0, 1, 2), Triangle::new(0, 2, 3)],
            material: None,
            mesh_type: MeshType::Opaque,
        }
    }

    /// Set the material index (builder style).
    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }

    /// Set the mesh type (builder style).
    pub fn with_type(mut self, mesh_type: MeshType) -> Self {
        self.mesh_type = mesh_type;
        self
    }
}

/// Shading attributes interpolated at a hit.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceAttributes {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub color: Color4,
}
