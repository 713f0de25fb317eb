use super::{
    calibration::CoordinateMapper,
    rotor::RotorSet,
    system_curve::{SystemCurveId, SystemCurveSpec},
};

/// Everything the user has entered for one analysis.
///
/// Every derived quantity is a pure function of a session and the analysis
/// settings; nothing derived is stored here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub mapper: CoordinateMapper,
    pub rotors: RotorSet,
    pub system_curves: [SystemCurveSpec; 2],
}

impl Session {
    #[must_use]
    pub fn system_curve(&self, id: SystemCurveId) -> &SystemCurveSpec {
        &self.system_curves[id.index()]
    }

    pub fn set_system_curve(&mut self, id: SystemCurveId, spec: SystemCurveSpec) {
        self.system_curves[id.index()] = spec;
    }

    /// Largest flow among all resolvable rotor points.
    ///
    /// Digitized rotors are ignored while the calibration is invalid.
    #[must_use]
    pub fn max_rotor_flow(&self) -> Option<f64> {
        self.rotors
            .iter()
            .filter_map(|rotor| rotor.physical_points(&self.mapper).ok())
            .flatten()
            .map(|p| p.flow())
            .filter(|q| q.is_finite())
            .reduce(f64::max)
    }
}
