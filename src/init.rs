use crate::{
    beamline::Beamline,
    elements::{Element, Fringe},
    error::{OpticsError, Result},
    reference::Reference,
    Float,
};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindTag {
    Drift,
    Quadrupole,
    Sbend,
    Sextupole,
    Multipole,
    FringeIn,
    FringeOut,
}

/// One `[[elements]]` table of the config file. Which fields are required
/// depends on `kind`; they are checked in `to_element`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementTable {
    pub kind: Option<KindTag>,
    pub name: Option<String>,
    pub length: Option<Float>,
    pub k1: Option<Float>,
    /// Quadrupole gradient in T/m, normalised by the reference rigidity.
    pub gradient: Option<Float>,
    pub k2: Option<Float>,
    /// Sextupole gradient in T/m^2, normalised by the reference rigidity.
    pub sextupole_gradient: Option<Float>,
    pub angle: Option<Float>,
    pub h: Option<Float>,
    pub face_angle: Option<Float>,
    pub gap: Option<Float>,
    pub fint: Option<Float>,
    pub pole_radius: Option<Float>,
}

impl ElementTable {
    pub fn to_element(&self, index: usize, reference: &Reference) -> Result<Element> {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| format!("element_{}", index));
        let context = format!("element {} `{}`", index, name);
        let kind = self
            .kind
            .ok_or_else(|| OpticsError::config(&context, "missing field `kind`"))?;
        let required = |field: &str, value: Option<Float>| {
            value.ok_or_else(|| OpticsError::config(&context, format!("missing field `{}`", field)))
        };

        let element = match kind {
            KindTag::Drift => Element::drift(name, required("length", self.length)?),
            KindTag::Quadrupole => Element::quadrupole(
                name,
                required("length", self.length)?,
                self.k1(&context, reference)?
                    .ok_or_else(|| OpticsError::config(&context, "missing field `k1` or `gradient`"))?,
            ),
            KindTag::Sbend => Element::sbend(
                name,
                required("length", self.length)?,
                required("angle", self.angle)?,
                self.k1(&context, reference)?.unwrap_or(0.0),
            ),
            KindTag::Sextupole => Element::sextupole(
                name,
                required("length", self.length)?,
                self.k2(&context, reference)?.ok_or_else(|| {
                    OpticsError::config(&context, "missing field `k2` or `sextupole_gradient`")
                })?,
            ),
            KindTag::Multipole => Element::multipole(
                name,
                required("length", self.length)?,
                self.k1(&context, reference)?.unwrap_or(0.0),
                self.k2(&context, reference)?.unwrap_or(0.0),
            ),
            KindTag::FringeIn | KindTag::FringeOut => {
                let fringe = Fringe {
                    h: required("h", self.h)?,
                    k1: self.k1(&context, reference)?.unwrap_or(0.0),
                    face_angle: self.face_angle.unwrap_or(0.0),
                    gap: self.gap.unwrap_or(0.0),
                    fint: self.fint.unwrap_or(0.0),
                    pole_radius: self.pole_radius,
                };
                if kind == KindTag::FringeIn {
                    Element::fringe_in(name, fringe)
                } else {
                    Element::fringe_out(name, fringe)
                }
            }
        };
        Ok(element)
    }

    fn k1(&self, context: &str, reference: &Reference) -> Result<Option<Float>> {
        match (self.k1, self.gradient) {
            (Some(_), Some(_)) => Err(OpticsError::config(
                context,
                "give either `k1` or `gradient`, not both",
            )),
            (Some(k1), None) => Ok(Some(k1)),
            (None, Some(g)) => Ok(Some(reference.normalize(g))),
            (None, None) => Ok(None),
        }
    }

    fn k2(&self, context: &str, reference: &Reference) -> Result<Option<Float>> {
        match (self.k2, self.sextupole_gradient) {
            (Some(_), Some(_)) => Err(OpticsError::config(
                context,
                "give either `k2` or `sextupole_gradient`, not both",
            )),
            (Some(k2), None) => Ok(Some(k2)),
            (None, Some(g)) => Ok(Some(reference.normalize(g))),
            (None, None) => Ok(None),
        }
    }
}

/// Converts the element tables of a config file into a validated beamline.
pub fn build_beamline(tables: &[ElementTable], reference: &Reference) -> Result<Beamline> {
    let mut beamline = Beamline::new();
    for (index, table) in tables.iter().enumerate() {
        let element = table.to_element(index, reference)?;
        element.validate()?;
        beamline.push(element);
    }
    Ok(beamline)
}
