use crate::{
    error::{OpticsError, Result},
    Float,
};

// Below this |cos| a face angle is treated as perpendicular to the beam.
const MIN_COS: Float = 1E-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    pub length: Float,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrupole {
    pub length: Float,
    pub k1: Float,
}

/// Sector bend, optionally combined-function through `k1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SBend {
    pub length: Float,
    pub angle: Float,
    pub k1: Float,
}

impl SBend {
    /// Curvature `h = angle / length` of the reference orbit.
    pub fn curvature(&self) -> Float {
        if self.length == 0.0 {
            0.0
        } else {
            self.angle / self.length
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sextupole {
    pub length: Float,
    pub k2: Float,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Multipole {
    pub length: Float,
    pub k1: Float,
    pub k2: Float,
}

/// Thin edge of a dipole. `face_angle` is the pole-face rotation,
/// `gap` the full magnet gap, `fint` the fringe-field integral and
/// `pole_radius` the curvature radius of the pole face (`None` for flat).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Fringe {
    pub h: Float,
    pub k1: Float,
    pub face_angle: Float,
    pub gap: Float,
    pub fint: Float,
    pub pole_radius: Option<Float>,
}

impl Fringe {
    /// Fringe-field correction `phi = fint h gap (1 + sin^2 b) / cos b`.
    pub fn fringe_angle(&self, h: Float) -> Float {
        let (sin_b, cos_b) = self.face_angle.sin_cos();
        self.fint * h * self.gap * (1.0 + sin_b * sin_b) / cos_b
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Drift(Drift),
    Quadrupole(Quadrupole),
    SBend(SBend),
    Sextupole(Sextupole),
    Multipole(Multipole),
    FringeIn(Fringe),
    FringeOut(Fringe),
}

impl ElementKind {
    pub fn length(&self) -> Float {
        match self {
            ElementKind::Drift(d) => d.length,
            ElementKind::Quadrupole(q) => q.length,
            ElementKind::SBend(b) => b.length,
            ElementKind::Sextupole(s) => s.length,
            ElementKind::Multipole(m) => m.length,
            ElementKind::FringeIn(_) | ElementKind::FringeOut(_) => 0.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Drift(_) => "drift",
            ElementKind::Quadrupole(_) => "quadrupole",
            ElementKind::SBend(_) => "sbend",
            ElementKind::Sextupole(_) => "sextupole",
            ElementKind::Multipole(_) => "multipole",
            ElementKind::FringeIn(_) => "fringe_in",
            ElementKind::FringeOut(_) => "fringe_out",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub kind: ElementKind,
}

impl Element {
    pub fn new<S: Into<String>>(name: S, kind: ElementKind) -> Element {
        Element {
            name: name.into(),
            kind,
        }
    }

    pub fn drift<S: Into<String>>(name: S, length: Float) -> Element {
        Element::new(name, ElementKind::Drift(Drift { length }))
    }

    pub fn quadrupole<S: Into<String>>(name: S, length: Float, k1: Float) -> Element {
        Element::new(name, ElementKind::Quadrupole(Quadrupole { length, k1 }))
    }

    pub fn sbend<S: Into<String>>(name: S, length: Float, angle: Float, k1: Float) -> Element {
        Element::new(name, ElementKind::SBend(SBend { length, angle, k1 }))
    }

    pub fn sextupole<S: Into<String>>(name: S, length: Float, k2: Float) -> Element {
        Element::new(name, ElementKind::Sextupole(Sextupole { length, k2 }))
    }

    pub fn multipole<S: Into<String>>(name: S, length: Float, k1: Float, k2: Float) -> Element {
        Element::new(name, ElementKind::Multipole(Multipole { length, k1, k2 }))
    }

    pub fn fringe_in<S: Into<String>>(name: S, fringe: Fringe) -> Element {
        Element::new(name, ElementKind::FringeIn(fringe))
    }

    pub fn fringe_out<S: Into<String>>(name: S, fringe: Fringe) -> Element {
        Element::new(name, ElementKind::FringeOut(fringe))
    }

    pub fn length(&self) -> Float {
        self.kind.length()
    }

    /// Checks that every parameter is finite and physically meaningful.
    pub fn validate(&self) -> Result<()> {
        match &self.kind {
            ElementKind::Drift(d) => self.check_length(d.length),
            ElementKind::Quadrupole(q) => {
                self.check_length(q.length)?;
                self.check_finite("k1", q.k1)
            }
            ElementKind::SBend(b) => {
                self.check_length(b.length)?;
                self.check_finite("angle", b.angle)?;
                self.check_finite("k1", b.k1)?;
                if b.length == 0.0 && b.angle != 0.0 {
                    return Err(self.invalid("a bend with zero length cannot have a bend angle"));
                }
                Ok(())
            }
            ElementKind::Sextupole(s) => {
                self.check_length(s.length)?;
                self.check_finite("k2", s.k2)
            }
            ElementKind::Multipole(m) => {
                self.check_length(m.length)?;
                self.check_finite("k1", m.k1)?;
                self.check_finite("k2", m.k2)
            }
            ElementKind::FringeIn(f) | ElementKind::FringeOut(f) => self.check_fringe(f),
        }
    }

    fn check_fringe(&self, f: &Fringe) -> Result<()> {
        self.check_finite("h", f.h)?;
        self.check_finite("k1", f.k1)?;
        self.check_finite("face_angle", f.face_angle)?;
        self.check_finite("gap", f.gap)?;
        self.check_finite("fint", f.fint)?;
        if f.gap < 0.0 {
            return Err(self.invalid(format!("gap must be non-negative, got {}", f.gap)));
        }
        if f.fint < 0.0 {
            return Err(self.invalid(format!("fint must be non-negative, got {}", f.fint)));
        }
        if let Some(r) = f.pole_radius {
            self.check_finite("pole_radius", r)?;
            if r == 0.0 {
                return Err(self.invalid("pole_radius must be non-zero"));
            }
        }
        if f.face_angle.cos().abs() < MIN_COS {
            return Err(self.invalid("face_angle must not be perpendicular to the beam"));
        }
        let psi = f.face_angle - f.fringe_angle(f.h);
        if !psi.is_finite() || psi.cos().abs() < MIN_COS {
            return Err(self.invalid("fringe-corrected face angle is perpendicular to the beam"));
        }
        Ok(())
    }

    fn check_length(&self, length: Float) -> Result<()> {
        self.check_finite("length", length)?;
        if length < 0.0 {
            return Err(self.invalid(format!("length must be non-negative, got {}", length)));
        }
        Ok(())
    }

    fn check_finite(&self, field: &str, value: Float) -> Result<()> {
        if !value.is_finite() {
            return Err(self.invalid(format!("{} must be finite, got {}", field, value)));
        }
        Ok(())
    }

    pub(crate) fn invalid<R: Into<String>>(&self, reason: R) -> OpticsError {
        OpticsError::config(format!("{} `{}`", self.kind.label(), self.name), reason)
    }
}
