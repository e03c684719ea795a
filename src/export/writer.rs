//! OBJ7 text output and attribute state.
//!
//! The writer tracks which render attributes are in effect and emits the
//! minimal `ATTR_*` lines needed before each primitive. Turn-offs are
//! written before turn-ons. Hard, panel and alpha never produce attribute
//! lines: the first two are primitive keywords, alpha is implicit.

use crate::config::ExportConfig;
use crate::error::Result;
use crate::mesher::Mesh;
use crate::strip::Strip;
use crate::types::{round_places, short_float, FaceFlags, Vertex};
use std::fmt::Write;

/// Polygon offset state. Starts unset for scenery so the first primitive
/// always states it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyOffset {
    Unset,
    On,
    Off,
}

/// Render attributes currently in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeState {
    pub two_sided: bool,
    pub flat: bool,
    /// `On` means no polygon offset (`ATTR_poly_os 0`).
    pub no_poly_offset: PolyOffset,
}

impl AttributeState {
    /// State at the start of every layer.
    pub fn initial(config: &ExportConfig) -> Self {
        Self {
            two_sided: false,
            flat: false,
            no_poly_offset: if config.forces_no_poly_offset() {
                PolyOffset::On
            } else {
                PolyOffset::Unset
            },
        }
    }
}

/// Light colour as written after the light's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightColour {
    /// Magic code X-Plane maps to a built-in light.
    Special(i32),
    /// RGB scaled to 0..10. Negative values flash.
    Rgb([f64; 3]),
}

/// Accumulates an OBJ7 document.
#[derive(Debug)]
pub struct Obj7Writer {
    out: String,
    state: AttributeState,
    primitives: usize,
}

impl Obj7Writer {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            out: String::with_capacity(4096),
            state: AttributeState::initial(config),
            primitives: 0,
        }
    }

    pub fn state(&self) -> AttributeState {
        self.state
    }

    /// Number of primitives written so far.
    pub fn primitives(&self) -> usize {
        self.primitives
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// The finished document and its primitive count.
    pub fn finish(self) -> (String, usize) {
        (self.out, self.primitives)
    }

    pub fn header(&mut self, config: &ExportConfig, texture: Option<&str>) -> Result<()> {
        let format = if config.is_csl() { "CSL format" } else { "" };
        write!(
            self.out,
            "{}\n700\t// \nOBJ\t// {}\n\n",
            config.platform.marker(),
            format
        )?;
        match texture {
            Some(texture) => write!(self.out, "{}\t\t// Texture\n\n", texture)?,
            None => write!(self.out, "none\t\t\t// Texture\n\n")?,
        }
        Ok(())
    }

    /// Start a detail layer. Attribute state resets to the initial state.
    pub fn begin_layer(
        &mut self,
        config: &ExportConfig,
        layer: u32,
        lod: Option<(u32, u32)>,
    ) -> Result<()> {
        if let Some((near, far)) = lod {
            write!(
                self.out,
                "\nATTR_LOD\t{} {}\t// Layer {}\n\n",
                near,
                far,
                layer / 2 + 1
            )?;
        }
        self.state = AttributeState::initial(config);
        Ok(())
    }

    pub fn layer_group(&mut self, group: &str, offset: i64) -> Result<()> {
        write!(self.out, "\nATTR_layer_group\t{}\t{}\t//\n\n", group, offset)?;
        Ok(())
    }

    /// Emit the attribute changes needed to draw faces with `flags`.
    pub fn update_attributes(&mut self, flags: FaceFlags) -> Result<()> {
        let two_sided = flags.is_two_sided();
        let flat = flags.is_flat();
        let no_offset = flags.is_no_poly_offset();

        if self.state.two_sided && !two_sided {
            self.out.push_str("ATTR_cull\t\t//\n\n");
        }
        if self.state.flat && !flat {
            self.out.push_str("ATTR_shade_smooth\t//\n\n");
        }
        if self.state.no_poly_offset != PolyOffset::Off && !no_offset {
            self.out.push_str("ATTR_poly_os\t2\t//\n\n");
        }

        if two_sided && !self.state.two_sided {
            self.out.push_str("ATTR_no_cull\t\t//\n\n");
        }
        if flat && !self.state.flat {
            self.out.push_str("ATTR_shade_flat\t\t//\n\n");
        }
        if no_offset && self.state.no_poly_offset != PolyOffset::On {
            self.out.push_str("ATTR_poly_os\t0\t//\n\n");
        }

        self.state = AttributeState {
            two_sided,
            flat,
            no_poly_offset: if no_offset {
                PolyOffset::On
            } else {
                PolyOffset::Off
            },
        };
        Ok(())
    }

    /// Write one strip of `mesh` as a single primitive.
    pub fn strip(&mut self, mesh: &Mesh, strip: &Strip) -> Result<()> {
        let Some(&first) = strip.faces.first() else {
            return Ok(());
        };
        let face = mesh.face(first);
        let n = face.len();
        self.update_attributes(face.flags)?;

        if strip.is_single() {
            // Start from the corner with the smallest s; X-Plane 8.00-8.06
            // misdraws quad_cockpit faces that don't start at the left.
            let mut start = 0;
            let mut min_s = f64::MAX;
            for (i, uv) in face.uvs.iter().enumerate() {
                if uv.s < min_s {
                    min_s = uv.s;
                    start = i;
                }
            }

            let keyword = if n == 3 {
                "tri\t"
            } else if face.flags.is_panel() {
                "quad_cockpit"
            } else if face.flags.is_hard() {
                "quad_hard"
            } else {
                "quad\t"
            };
            write!(self.out, "{}\t\t// {}\n", keyword, mesh.name)?;
            for k in 0..n {
                let i = (start + n - k) % n;
                writeln!(
                    self.out,
                    "{}\t{}",
                    mesh.vertex(face.vertices[i]),
                    face.uvs[i]
                )?;
            }
        } else if n == 3 {
            write!(self.out, "tri_fan {}\t\t// {}\n", strip.len() + 2, mesh.name)?;
            let fv = strip.first_vertex;
            for i in [(fv + 1) % 3, fv] {
                writeln!(
                    self.out,
                    "{}\t{}",
                    mesh.vertex(face.vertices[i]),
                    face.uvs[i]
                )?;
            }
            let centre = face.vertices[(fv + 1) % 3];
            let mut last = face.vertices[fv];
            for &fi in &strip.faces {
                let f = mesh.face(fi);
                if let Some(i) = (0..3).find(|&i| f.vertices[i] != centre && f.vertices[i] != last) {
                    writeln!(self.out, "{}\t{}", mesh.vertex(f.vertices[i]), f.uvs[i])?;
                    last = f.vertices[i];
                }
            }
        } else {
            write!(
                self.out,
                "quad_strip {}\t\t// {}\n",
                (strip.len() + 1) * 2,
                mesh.name
            )?;
            let fv = strip.first_vertex;
            let a = (fv + 1) % 4;
            writeln!(
                self.out,
                "{}\t{}\t{}\t{}",
                mesh.vertex(face.vertices[a]),
                face.uvs[a],
                mesh.vertex(face.vertices[fv]),
                face.uvs[fv]
            )?;
            let mut last = face.vertices[a];
            for &fi in &strip.faces {
                let f = mesh.face(fi);
                if let Some(i) = (0..4).find(|&i| f.vertices[i] == last) {
                    let (b, c) = ((i + 1) % 4, (i + 2) % 4);
                    writeln!(
                        self.out,
                        "{}\t{}\t{}\t{}",
                        mesh.vertex(f.vertices[b]),
                        f.uvs[b],
                        mesh.vertex(f.vertices[c]),
                        f.uvs[c]
                    )?;
                    last = f.vertices[b];
                }
            }
        }

        self.out.push('\n');
        self.primitives += 1;
        Ok(())
    }

    /// Named smoke puff at `origin`.
    pub fn smoke(&mut self, kind: &str, origin: &Vertex, size: f64) -> Result<()> {
        write!(self.out, "{}\t{}\t{:4.2}\t//\n\n", kind, origin, size)?;
        self.primitives += 1;
        Ok(())
    }

    pub fn light(&mut self, name: &str, origin: &Vertex, colour: LightColour) -> Result<()> {
        writeln!(self.out, "light\t\t\t// {}", name)?;
        match colour {
            LightColour::Special(code) => write!(
                self.out,
                "{}\t{:2}     {:2}     {:2}\n\n",
                origin, code, code, code
            )?,
            LightColour::Rgb(rgb) => {
                let [r, g, b] = rgb.map(colour_text);
                write!(self.out, "{}\t{:<6} {:<6} {:<6}\n\n", origin, r, g, b)?
            }
        }
        self.primitives += 1;
        Ok(())
    }

    /// Line between two points, colour components already formatted.
    pub fn line(&mut self, name: &str, ends: [&Vertex; 2], colour: &[String; 3]) -> Result<()> {
        writeln!(self.out, "line\t\t\t// {}", name)?;
        let [r, g, b] = colour;
        writeln!(self.out, "{}\t{:<6} {:<6} {:<6}", ends[0], r, g, b)?;
        write!(self.out, "{}\t{:<6} {:<6} {:<6}\n\n", ends[1], r, g, b)?;
        self.primitives += 1;
        Ok(())
    }

    pub fn footer(&mut self, config: &ExportConfig) -> Result<()> {
        self.out.push_str("end\t\t\t// eof\n\n");
        writeln!(
            self.out,
            "// Built with {}. Exported with {}.",
            config.host, config.generator
        )?;
        Ok(())
    }
}

/// A colour component rounded to three places, as written.
pub fn colour_text(value: f64) -> String {
    short_float(round_places(value, 3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesher::Face;
    use crate::types::Uv;

    fn writer() -> Obj7Writer {
        Obj7Writer::new(&ExportConfig::default())
    }

    fn unit_quad(flags: FaceFlags, uvs: [Uv; 4]) -> Mesh {
        let mut mesh = Mesh::new(
            "Box",
            vec![
                Vertex::new(0.0, 0.0, 0.0),
                Vertex::new(1.0, 0.0, 0.0),
                Vertex::new(1.0, 1.0, 0.0),
                Vertex::new(0.0, 1.0, 0.0),
            ],
        );
        let mut face = Face::new(flags, 0);
        for (v, uv) in uvs.into_iter().enumerate() {
            face.add_corner(v, uv);
        }
        mesh.add_face(face);
        mesh
    }

    #[test]
    fn test_header() {
        let mut w = writer();
        w.header(&ExportConfig::default(), Some("wall")).unwrap();
        assert_eq!(w.as_str(), "I\n700\t// \nOBJ\t// \n\nwall\t\t// Texture\n\n");

        let config = ExportConfig::default()
            .with_csl()
            .with_platform(crate::config::Platform::Apple);
        let mut w = Obj7Writer::new(&config);
        w.header(&config, None).unwrap();
        assert_eq!(
            w.as_str(),
            "A\n700\t// \nOBJ\t// CSL format\n\nnone\t\t\t// Texture\n\n"
        );
    }

    #[test]
    fn test_two_sided_toggle() {
        let mut w = writer();
        w.update_attributes(FaceFlags::NPOLY).unwrap();
        w.update_attributes(FaceFlags::NPOLY | FaceFlags::TWOSIDE).unwrap();
        w.update_attributes(FaceFlags::NPOLY | FaceFlags::TWOSIDE).unwrap();
        w.update_attributes(FaceFlags::NPOLY).unwrap();
        assert_eq!(
            w.as_str(),
            "ATTR_poly_os\t0\t//\n\nATTR_no_cull\t\t//\n\nATTR_cull\t\t//\n\n"
        );
    }

    #[test]
    fn test_turn_offs_before_turn_ons() {
        let mut w = writer();
        w.update_attributes(FaceFlags::FLAT | FaceFlags::NPOLY).unwrap();
        w.update_attributes(FaceFlags::TWOSIDE).unwrap();
        assert_eq!(
            w.as_str(),
            "ATTR_shade_flat\t\t//\n\nATTR_poly_os\t0\t//\n\n\
             ATTR_shade_smooth\t//\n\nATTR_poly_os\t2\t//\n\nATTR_no_cull\t\t//\n\n"
        );
    }

    #[test]
    fn test_attribute_lines_between_strips() {
        let mut w = writer();
        for flags in [
            FaceFlags::TWOSIDE | FaceFlags::NPOLY,
            FaceFlags::TWOSIDE | FaceFlags::NPOLY,
            FaceFlags::NONE,
            FaceFlags::TWOSIDE | FaceFlags::FLAT,
            FaceFlags::NPOLY,
        ] {
            let mesh = unit_quad(flags, [Uv::default(); 4]);
            w.strip(&mesh, &Strip::single(0, 0, 4)).unwrap();
        }

        let lines: Vec<&str> = w
            .as_str()
            .lines()
            .filter(|l| !l.is_empty() && !l.starts_with(' '))
            .collect();
        assert_eq!(
            lines,
            vec![
                "ATTR_no_cull\t\t//",
                "ATTR_poly_os\t0\t//",
                "quad\t\t\t// Box",
                "quad\t\t\t// Box",
                "ATTR_cull\t\t//",
                "ATTR_poly_os\t2\t//",
                "quad\t\t\t// Box",
                "ATTR_no_cull\t\t//",
                "ATTR_shade_flat\t\t//",
                "quad\t\t\t// Box",
                "ATTR_cull\t\t//",
                "ATTR_shade_smooth\t//",
                "ATTR_poly_os\t0\t//",
                "quad\t\t\t// Box",
            ]
        );
        assert_eq!(w.primitives(), 5);
    }

    #[test]
    fn test_offset_stated_once_for_scenery() {
        let mut w = writer();
        w.update_attributes(FaceFlags::NONE).unwrap();
        w.update_attributes(FaceFlags::NONE).unwrap();
        assert_eq!(w.as_str(), "ATTR_poly_os\t2\t//\n\n");
    }

    #[test]
    fn test_cockpit_starts_without_offset() {
        let config = ExportConfig::default().with_cockpit(true);
        let mut w = Obj7Writer::new(&config);
        w.update_attributes(FaceFlags::NPOLY | FaceFlags::ALPHA | FaceFlags::PANEL)
            .unwrap();
        assert_eq!(w.as_str(), "");
    }

    #[test]
    fn test_layer_resets_state() {
        let config = ExportConfig::default();
        let mut w = writer();
        w.update_attributes(FaceFlags::TWOSIDE).unwrap();
        w.begin_layer(&config, 2, Some((1000, 4000))).unwrap();
        assert_eq!(w.state(), AttributeState::initial(&config));
        assert!(w.as_str().ends_with("\nATTR_LOD\t1000 4000\t// Layer 2\n\n"));
    }

    #[test]
    fn test_single_quad_starts_at_smallest_s() {
        let uvs = [
            Uv::new(1.0, 0.0),
            Uv::new(0.0, 0.0),
            Uv::new(0.0, 1.0),
            Uv::new(1.0, 1.0),
        ];
        let mesh = unit_quad(FaceFlags::NPOLY, uvs);
        let mut w = writer();
        w.strip(&mesh, &Strip::single(0, 0, 4)).unwrap();

        let lines: Vec<&str> = w.as_str().lines().collect();
        assert_eq!(lines[2], "quad\t\t\t// Box");
        assert_eq!(lines[3], "   1.0000    0.0000    0.0000\t0.0    0.0   ");
        assert_eq!(lines[4], "   0.0000    0.0000    0.0000\t1.0    0.0   ");
        assert_eq!(lines[5], "   0.0000    1.0000    0.0000\t1.0    1.0   ");
        assert_eq!(lines[6], "   1.0000    1.0000    0.0000\t0.0    1.0   ");
        assert_eq!(w.primitives(), 1);
    }

    #[test]
    fn test_quad_keywords() {
        let uvs = [Uv::default(); 4];
        let mut w = writer();
        w.strip(&unit_quad(FaceFlags::HARD, uvs), &Strip::single(0, 0, 4))
            .unwrap();
        w.strip(
            &unit_quad(FaceFlags::PANEL | FaceFlags::NPOLY, uvs),
            &Strip::single(0, 0, 4),
        )
        .unwrap();
        assert!(w.as_str().contains("quad_hard\t\t// Box\n"));
        assert!(w.as_str().contains("quad_cockpit\t\t// Box\n"));
    }

    #[test]
    fn test_quad_strip_output() {
        // Two quads stacked vertically, sharing the edge at y = 1.
        let mut mesh = Mesh::new(
            "Wall",
            (0..3)
                .flat_map(|y| [Vertex::new(0.0, y as f64, 0.0), Vertex::new(1.0, y as f64, 0.0)])
                .collect(),
        );
        for (i, corners) in [[0, 1, 3, 2], [2, 3, 5, 4]].into_iter().enumerate() {
            let mut face = Face::new(FaceFlags::NPOLY, i);
            for v in corners {
                face.add_corner(v, Uv::default());
            }
            mesh.add_face(face);
        }
        let strip = Strip {
            mesh: 0,
            faces: vec![1, 0],
            first_vertex: 2,
            sides: 4,
        };
        let mut w = writer();
        w.strip(&mesh, &strip).unwrap();

        let body: Vec<&str> = w.as_str().lines().skip(2).collect();
        assert_eq!(body[0], "quad_strip 6\t\t// Wall");
        assert!(body[1].starts_with("   0.0000    2.0000"));
        assert!(body[1].contains("\t   1.0000    2.0000"));
        assert!(body[2].starts_with("   0.0000    1.0000"));
        assert!(body[2].contains("\t   1.0000    1.0000"));
        assert!(body[3].starts_with("   0.0000    0.0000"));
        assert!(body[3].contains("\t   1.0000    0.0000"));
    }

    #[test]
    fn test_tri_fan_output() {
        let mut mesh = Mesh::new(
            "Fan",
            vec![
                Vertex::new(0.0, 0.0, 0.0),
                Vertex::new(1.0, 0.0, 0.0),
                Vertex::new(0.0, 1.0, 0.0),
                Vertex::new(-1.0, 0.0, 0.0),
            ],
        );
        for (i, corners) in [[0, 2, 3], [0, 1, 2]].into_iter().enumerate() {
            let mut face = Face::new(FaceFlags::NPOLY, i);
            for v in corners {
                face.add_corner(v, Uv::default());
            }
            mesh.add_face(face);
        }
        let strip = Strip {
            mesh: 0,
            faces: vec![0, 1],
            first_vertex: 2,
            sides: 3,
        };
        let mut w = writer();
        w.strip(&mesh, &strip).unwrap();

        let body: Vec<&str> = w.as_str().lines().skip(2).collect();
        assert_eq!(body[0], "tri_fan 4\t\t// Fan");
        assert!(body[1].starts_with("   0.0000    0.0000"));
        assert!(body[2].starts_with("  -1.0000    0.0000"));
        assert!(body[3].starts_with("   0.0000    1.0000"));
        assert!(body[4].starts_with("   1.0000    0.0000"));
    }

    #[test]
    fn test_light_and_line_formats() {
        let mut w = writer();
        let origin = Vertex::new(1.0, 2.0, -3.0);
        w.light("Beacon", &origin, LightColour::Special(99)).unwrap();
        w.light("Lamp", &origin, LightColour::Rgb([10.0, 5.0, 0.0])).unwrap();
        w.line(
            "Wire",
            [&origin, &Vertex::new(0.0, 0.0, 0.0)],
            &["5".to_string(), "5".to_string(), "5".to_string()],
        )
        .unwrap();
        w.smoke("smoke_black", &origin, 1.5).unwrap();

        assert_eq!(
            w.as_str(),
            "light\t\t\t// Beacon\n   1.0000    2.0000   -3.0000\t99     99     99\n\n\
             light\t\t\t// Lamp\n   1.0000    2.0000   -3.0000\t10.0   5.0    0.0   \n\n\
             line\t\t\t// Wire\n   1.0000    2.0000   -3.0000\t5      5      5     \n\
             \x20\x20\x200.0000    0.0000    0.0000\t5      5      5     \n\n\
             smoke_black\t   1.0000    2.0000   -3.0000\t1.50\t//\n\n"
        );
        assert_eq!(w.primitives(), 4);
    }

    #[test]
    fn test_footer() {
        let mut config = ExportConfig::default();
        config.generator = "xplane-obj7 0.1.0".to_string();
        let mut w = Obj7Writer::new(&config);
        w.footer(&config).unwrap();
        assert_eq!(
            w.as_str(),
            "end\t\t\t// eof\n\n// Built with Blender. Exported with xplane-obj7 0.1.0.\n"
        );
    }
}
