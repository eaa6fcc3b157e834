//! Composite rigid-body inertia of the whole tree about the base origin.
//!
//! With all joint accelerations held at zero the tree moves as one rigid
//! body, so the base rows of the equations of motion only need its total
//! mass, first mass moment and rotational inertia.

use fbm_ad::Real;
use nalgebra::{Matrix3, Vector3};

use super::{Data, Model};
use crate::spatial::SpatialInertia;

impl<T: Real> Data<T> {
    /// Accumulate the composite inertia in base coordinates.
    ///
    /// Requires [`forward_kinematics`](Data::forward_kinematics).
    pub fn composite_inertia(&mut self, model: &Model) {
        let mut mass = T::zero();
        let mut moment = Vector3::zeros();
        let mut inertia = Matrix3::zeros();

        for i in 0..model.nbody() {
            let rot = self.body_rot[i];
            let body_mass = T::from_f64(model.body_mass[i]);
            let com = self.body_pos[i] + rot * model.body_ipos[i].map(T::from_f64);
            let inertia_com = rot * model.body_inertia[i].map(T::from_f64) * rot.transpose();
            let shifted = SpatialInertia {
                mass: body_mass,
                com,
                inertia_com,
            };

            mass += body_mass;
            moment += com * body_mass;
            inertia += shifted.inertia_origin();
        }

        self.crb_mass = mass;
        self.crb_moment = moment;
        self.crb_inertia = inertia;
    }

    /// Center of mass of the tree in base coordinates.
    ///
    /// Requires [`composite_inertia`](Data::composite_inertia).
    #[must_use]
    pub fn center_of_mass(&self) -> Vector3<T> {
        self.crb_moment * (T::one() / self.crb_mass)
    }
}
