//! Factory methods for canonical legged robots.
//!
//! These produce ready-to-use [`Model`] instances with plausible mass
//! properties. Used by inline tests, benches and `fbm-conformance-tests`.

use fbm_types::ContactKind;
use nalgebra::{Matrix3, Vector3};

use super::model::{ContactFrame, Model, RevoluteBody};

fn diag(x: f64, y: f64, z: f64) -> Matrix3<f64> {
    Matrix3::from_diagonal(&Vector3::new(x, y, z))
}

impl Model {
    /// Create a quadruped with three revolute joints per leg.
    ///
    /// Legs are built in the order LF, RF, LH, RH; each has a hip
    /// abduction/adduction joint (x axis), a hip flexion/extension joint
    /// (y axis) and a knee flexion/extension joint (y axis). Each leg ends
    /// in a point contact `<LEG>_FOOT`.
    ///
    /// Joint order: `LF_HAA, LF_HFE, LF_KFE, RF_HAA, ...` (12 joints).
    #[must_use]
    pub fn quadruped() -> Self {
        let mut model = Self::floating_base("quadruped", 12.0, Vector3::new(0.0, 0.0, 0.02), diag(0.12, 0.35, 0.4));

        for (leg, sx, sy) in [("LF", 1.0, 1.0), ("RF", 1.0, -1.0), ("LH", -1.0, 1.0), ("RH", -1.0, -1.0)] {
            let haa = model.push_body(
                RevoluteBody::new(format!("{leg}_HAA"), 0, Vector3::x())
                    .at(Vector3::new(0.3 * sx, 0.15 * sy, 0.0))
                    .inertial(1.0, Vector3::new(0.04 * sx, 0.02 * sy, 0.0), diag(0.002, 0.002, 0.002)),
            );
            let hfe = model.push_body(
                RevoluteBody::new(format!("{leg}_HFE"), haa, Vector3::y())
                    .at(Vector3::new(0.06 * sx, 0.08 * sy, 0.0))
                    .inertial(1.2, Vector3::new(0.0, 0.02 * sy, -0.12), diag(0.015, 0.015, 0.002)),
            );
            let kfe = model.push_body(
                RevoluteBody::new(format!("{leg}_KFE"), hfe, Vector3::y())
                    .at(Vector3::new(0.0, 0.0, -0.3))
                    .inertial(0.3, Vector3::new(0.0, 0.0, -0.14), diag(0.004, 0.004, 0.0005)),
            );
            model.contacts.push(ContactFrame {
                name: format!("{leg}_FOOT"),
                body: kfe,
                pos: Vector3::new(0.0, 0.0, -0.3),
                kind: ContactKind::Point,
            });
        }
        model
    }

    /// Create a biped with six revolute joints per leg and flat feet.
    ///
    /// Joint order per leg (left first): hip yaw (z), hip roll (x), hip
    /// pitch (y), knee (y), ankle pitch (y), ankle roll (x). Each foot is a
    /// wrench contact `L_SOLE` / `R_SOLE` below the ankle.
    #[must_use]
    pub fn biped() -> Self {
        let mut model = Self::floating_base("biped", 18.0, Vector3::new(0.0, 0.0, 0.1), diag(0.4, 0.3, 0.2));

        for (side, sy) in [("L", 1.0), ("R", -1.0)] {
            let joints = [
                ("HIP_YAW", Vector3::z(), Vector3::new(0.0, 0.1 * sy, -0.1), 0.8, Vector3::zeros()),
                ("HIP_ROLL", Vector3::x(), Vector3::zeros(), 1.0, Vector3::zeros()),
                ("HIP_PITCH", Vector3::y(), Vector3::zeros(), 3.0, Vector3::new(0.0, 0.0, -0.17)),
                ("KNEE", Vector3::y(), Vector3::new(0.0, 0.0, -0.35), 2.0, Vector3::new(0.0, 0.0, -0.16)),
                ("ANKLE_PITCH", Vector3::y(), Vector3::new(0.0, 0.0, -0.35), 0.4, Vector3::zeros()),
                ("ANKLE_ROLL", Vector3::x(), Vector3::zeros(), 0.8, Vector3::new(0.02, 0.0, -0.03)),
            ];

            let mut parent = 0;
            for (name, axis, pos, mass, ipos) in joints {
                let spread = 0.05 * mass;
                parent = model.push_body(
                    RevoluteBody::new(format!("{side}_{name}"), parent, axis)
                        .at(pos)
                        .inertial(mass, ipos, diag(spread * 0.2, spread * 0.2, spread * 0.05)),
                );
            }
            model.contacts.push(ContactFrame {
                name: format!("{side}_SOLE"),
                body: parent,
                pos: Vector3::new(0.03, 0.0, -0.06),
                kind: ContactKind::Wrench,
            });
        }
        model
    }
}
