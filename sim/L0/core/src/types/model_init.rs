//! Model construction and precomputation methods.
//!
//! This module contains [`Model::empty()`], the `add_*` builder methods, and
//! [`Model::finalize()`], which validates the topology and precomputes the
//! address arrays, body DOF chains, tendon DOF patterns and the
//! `qpos0`-dependent equality parameters.

use nalgebra::{DVector, Quaternion, UnitQuaternion, Vector3};
use sim_types::{ConstraintOptions, SimError};

use super::data::Data;
use super::enums::{EqualityType, MjJointType};
use super::model::{EQ_DATA_SIZE, Model};
use crate::constraint::orientation::normalize_axis;
use crate::forward::mj_fwd_position;

/// Marker for "no second object" in `eq_obj2id` of joint/tendon couplings.
pub const NO_OBJECT: usize = usize::MAX;

impl Model {
    /// Create an empty model with only the world body.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            name: String::new(),

            nq: 0,
            nv: 0,
            nbody: 1, // World body 0 always exists
            njnt: 0,
            ngeom: 0,
            ntendon: 0,
            nwrap: 0,
            neq: 0,

            body_parent: vec![0],
            body_jnt_adr: vec![0],
            body_jnt_num: vec![0],
            body_dof_adr: vec![0],
            body_dof_num: vec![0],
            body_pos: vec![Vector3::zeros()],
            body_quat: vec![UnitQuaternion::identity()],
            body_name: vec![Some("world".to_string())],

            body_chain_adr: vec![0],
            body_chain_num: vec![0],
            body_chain: vec![],

            jnt_type: vec![],
            jnt_body: vec![],
            jnt_qpos_adr: vec![],
            jnt_dof_adr: vec![],
            jnt_pos: vec![],
            jnt_axis: vec![],
            jnt_limited: vec![],
            jnt_range: vec![],
            jnt_margin: vec![],
            jnt_name: vec![],

            dof_body: vec![],
            dof_jnt: vec![],
            dof_parent: vec![],
            dof_frictionloss: vec![],

            geom_body: vec![],
            geom_pos: vec![],
            geom_name: vec![],

            tendon_adr: vec![],
            tendon_num: vec![],
            tendon_limited: vec![],
            tendon_range: vec![],
            tendon_margin: vec![],
            tendon_frictionloss: vec![],
            tendon_length0: vec![],
            tendon_name: vec![],
            wrap_jnt: vec![],
            wrap_coef: vec![],

            tendon_dof_adr: vec![],
            tendon_dof_num: vec![],
            tendon_dofs: vec![],

            eq_type: vec![],
            eq_obj1id: vec![],
            eq_obj2id: vec![],
            eq_active: vec![],
            eq_data: vec![],
            eq_name: vec![],

            qpos0: DVector::zeros(0),
            opt: ConstraintOptions::default(),
        }
    }

    // ==================== Builder ====================

    /// Add a body as a child of `parent`. Returns the new body id.
    ///
    /// Bodies must be added parent-first; `finalize` rejects any other order.
    pub fn add_body(
        &mut self,
        parent: usize,
        pos: Vector3<f64>,
        quat: UnitQuaternion<f64>,
        name: Option<&str>,
    ) -> usize {
        let id = self.nbody;
        self.body_parent.push(parent);
        self.body_pos.push(pos);
        self.body_quat.push(quat);
        self.body_name.push(name.map(str::to_string));
        self.body_jnt_adr.push(0);
        self.body_jnt_num.push(0);
        self.body_dof_adr.push(0);
        self.body_dof_num.push(0);
        self.nbody += 1;
        id
    }

    /// Add a joint to `body`. Returns the new joint id.
    ///
    /// Joints must be added in body order. `pos` is the anchor in the body
    /// frame; `axis` is ignored for ball and free joints.
    pub fn add_joint(
        &mut self,
        body: usize,
        jnt_type: MjJointType,
        pos: Vector3<f64>,
        axis: Vector3<f64>,
    ) -> usize {
        let id = self.njnt;
        self.jnt_type.push(jnt_type);
        self.jnt_body.push(body);
        self.jnt_qpos_adr.push(self.nq);
        self.jnt_dof_adr.push(self.nv);
        self.jnt_pos.push(pos);
        self.jnt_axis.push(axis);
        self.jnt_limited.push(false);
        self.jnt_range.push((0.0, 0.0));
        self.jnt_margin.push(0.0);
        self.jnt_name.push(None);

        let mut qpos0 = self.qpos0.as_slice().to_vec();
        match jnt_type {
            MjJointType::Hinge | MjJointType::Slide => qpos0.push(0.0),
            MjJointType::Ball => qpos0.extend_from_slice(&[1.0, 0.0, 0.0, 0.0]),
            MjJointType::Free => {
                let p = self.body_pos.get(body).copied().unwrap_or_else(Vector3::zeros);
                let q = self
                    .body_quat
                    .get(body)
                    .copied()
                    .unwrap_or_else(UnitQuaternion::identity);
                qpos0.extend_from_slice(&[p.x, p.y, p.z, q.w, q.i, q.j, q.k]);
            }
        }
        self.qpos0 = DVector::from_vec(qpos0);

        for _ in 0..jnt_type.nv() {
            self.dof_body.push(body);
            self.dof_jnt.push(id);
            self.dof_parent.push(None);
            self.dof_frictionloss.push(0.0);
        }
        self.nq += jnt_type.nq();
        self.nv += jnt_type.nv();
        self.njnt += 1;
        id
    }

    /// Enable limits on a joint. For ball joints only `hi` (the cone angle)
    /// is used.
    pub fn set_joint_limits(&mut self, jnt: usize, lo: f64, hi: f64, margin: f64) {
        self.jnt_limited[jnt] = true;
        self.jnt_range[jnt] = (lo, hi);
        self.jnt_margin[jnt] = margin;
    }

    /// Set the friction loss of every DOF of `jnt`.
    pub fn set_joint_frictionloss(&mut self, jnt: usize, frictionloss: f64) {
        let adr = self.jnt_dof_adr[jnt];
        for dof in adr..adr + self.jnt_type[jnt].nv() {
            self.dof_frictionloss[dof] = frictionloss;
        }
    }

    /// Add a geom attached to `body`. Returns the new geom id.
    pub fn add_geom(&mut self, body: usize, pos: Vector3<f64>, name: Option<&str>) -> usize {
        let id = self.ngeom;
        self.geom_body.push(body);
        self.geom_pos.push(pos);
        self.geom_name.push(name.map(str::to_string));
        self.ngeom += 1;
        id
    }

    /// Add a fixed tendon `L = Σ coef · q(jnt)`. Returns the new tendon id.
    ///
    /// An empty `wraps` list gives a dofless tendon of constant length 0.
    pub fn add_fixed_tendon(&mut self, wraps: &[(usize, f64)]) -> usize {
        let id = self.ntendon;
        self.tendon_adr.push(self.nwrap);
        self.tendon_num.push(wraps.len());
        for &(jnt, coef) in wraps {
            self.wrap_jnt.push(jnt);
            self.wrap_coef.push(coef);
        }
        self.nwrap += wraps.len();
        self.tendon_limited.push(false);
        self.tendon_range.push((0.0, 0.0));
        self.tendon_margin.push(0.0);
        self.tendon_frictionloss.push(0.0);
        self.tendon_length0.push(0.0);
        self.tendon_name.push(None);
        self.ntendon += 1;
        id
    }

    /// Enable length limits on a tendon.
    pub fn set_tendon_limits(&mut self, tendon: usize, lo: f64, hi: f64, margin: f64) {
        self.tendon_limited[tendon] = true;
        self.tendon_range[tendon] = (lo, hi);
        self.tendon_margin[tendon] = margin;
    }

    /// Add an equality constraint with raw parameters. Returns its id.
    pub fn add_equality(
        &mut self,
        eq_type: EqualityType,
        obj1: usize,
        obj2: usize,
        data: [f64; EQ_DATA_SIZE],
    ) -> usize {
        let id = self.neq;
        self.eq_type.push(eq_type);
        self.eq_obj1id.push(obj1);
        self.eq_obj2id.push(obj2);
        self.eq_active.push(true);
        self.eq_data.push(data);
        self.eq_name.push(None);
        self.neq += 1;
        id
    }

    /// Ball coupling of `anchor` (body1 frame) to body2. The matching anchor
    /// on body2 is computed by `finalize` so the constraint holds at `qpos0`.
    pub fn add_connect(&mut self, body1: usize, body2: usize, anchor: Vector3<f64>) -> usize {
        let mut data = [0.0; EQ_DATA_SIZE];
        data[0..3].copy_from_slice(anchor.as_slice());
        self.add_equality(EqualityType::Connect, body1, body2, data)
    }

    /// Weld body1 to body2 at `anchor` (body2 frame).
    ///
    /// With `relpose = None` the relative pose is taken from `qpos0` at
    /// `finalize`; otherwise `(relpos, relquat)` give body1's anchor and the
    /// target orientation of body2 relative to body1.
    pub fn add_weld(
        &mut self,
        body1: usize,
        body2: usize,
        anchor: Vector3<f64>,
        relpose: Option<(Vector3<f64>, UnitQuaternion<f64>)>,
        torquescale: f64,
    ) -> usize {
        let mut data = [0.0; EQ_DATA_SIZE];
        data[0..3].copy_from_slice(anchor.as_slice());
        if let Some((relpos, relquat)) = relpose {
            data[3..6].copy_from_slice(relpos.as_slice());
            data[6..10].copy_from_slice(&[relquat.w, relquat.i, relquat.j, relquat.k]);
        }
        data[10] = torquescale;
        self.add_equality(EqualityType::Weld, body1, body2, data)
    }

    /// Joint coupling `q1 − q1₀ = poly(q2 − q2₀)`; `jnt2 = None` pins `jnt1`.
    pub fn add_joint_equality(
        &mut self,
        jnt1: usize,
        jnt2: Option<usize>,
        polycoef: [f64; 5],
    ) -> usize {
        let mut data = [0.0; EQ_DATA_SIZE];
        data[0..5].copy_from_slice(&polycoef);
        self.add_equality(EqualityType::Joint, jnt1, jnt2.unwrap_or(NO_OBJECT), data)
    }

    /// Tendon coupling `L1 − L1₀ = poly(L2 − L2₀)`; `tendon2 = None` pins `tendon1`.
    pub fn add_tendon_equality(
        &mut self,
        tendon1: usize,
        tendon2: Option<usize>,
        polycoef: [f64; 5],
    ) -> usize {
        let mut data = [0.0; EQ_DATA_SIZE];
        data[0..5].copy_from_slice(&polycoef);
        self.add_equality(EqualityType::Tendon, tendon1, tendon2.unwrap_or(NO_OBJECT), data)
    }

    // ==================== Finalize ====================

    /// Validate the model and compute all derived arrays.
    ///
    /// Must be called once after the last `add_*` call and before
    /// [`Model::make_data`].
    pub fn finalize(&mut self) -> Result<(), SimError> {
        self.opt.validate()?;
        self.validate_topology()?;
        self.normalize_joint_axes();
        self.compute_body_addresses();
        self.compute_dof_parents();
        self.compute_body_chains();
        self.compute_tendon_dofs();
        self.compute_reference_quantities();
        tracing::debug!(
            nbody = self.nbody,
            njnt = self.njnt,
            nv = self.nv,
            ntendon = self.ntendon,
            neq = self.neq,
            "model finalized"
        );
        Ok(())
    }

    fn validate_topology(&self) -> Result<(), SimError> {
        if self.qpos0.len() != self.nq {
            return Err(SimError::dimension_mismatch("qpos0", self.nq, self.qpos0.len()));
        }
        for b in 1..self.nbody {
            if self.body_parent[b] >= b {
                return Err(SimError::invalid_model(format!(
                    "body {b} has parent {} which is not added before it",
                    self.body_parent[b]
                )));
            }
        }
        for j in 0..self.njnt {
            let body = self.jnt_body[j];
            if body == 0 || body >= self.nbody {
                return Err(SimError::invalid_model(format!(
                    "joint {j} attached to invalid body {body}"
                )));
            }
            if j > 0 && self.jnt_body[j - 1] > body {
                return Err(SimError::invalid_model(format!(
                    "joint {j} on body {body} added after a joint of body {}",
                    self.jnt_body[j - 1]
                )));
            }
            if self.jnt_type[j] == MjJointType::Free && self.body_parent[body] != 0 {
                return Err(SimError::invalid_model(format!(
                    "free joint {j} on body {body} which is not a child of the world"
                )));
            }
            if self.jnt_limited[j] {
                let (lo, hi) = self.jnt_range[j];
                if !(lo <= hi) {
                    return Err(SimError::invalid_model(format!(
                        "joint {j} has range ({lo}, {hi})"
                    )));
                }
            }
        }
        for g in 0..self.ngeom {
            if self.geom_body[g] >= self.nbody {
                return Err(SimError::invalid_model(format!(
                    "geom {g} attached to invalid body {}",
                    self.geom_body[g]
                )));
            }
        }
        for w in 0..self.nwrap {
            let j = self.wrap_jnt[w];
            if j >= self.njnt
                || !matches!(self.jnt_type[j], MjJointType::Hinge | MjJointType::Slide)
            {
                return Err(SimError::invalid_model(format!(
                    "tendon wrap {w} references joint {j}, which is not a hinge or slide"
                )));
            }
        }
        for t in 0..self.ntendon {
            if self.tendon_limited[t] {
                let (lo, hi) = self.tendon_range[t];
                if !(lo <= hi) {
                    return Err(SimError::invalid_model(format!(
                        "tendon {t} has range ({lo}, {hi})"
                    )));
                }
            }
        }
        for e in 0..self.neq {
            let (o1, o2) = (self.eq_obj1id[e], self.eq_obj2id[e]);
            let ok = match self.eq_type[e] {
                EqualityType::Connect | EqualityType::Weld => {
                    o1 < self.nbody && o2 < self.nbody && o1 != o2
                }
                EqualityType::Joint => {
                    let scalar = |j: usize| {
                        j < self.njnt
                            && matches!(self.jnt_type[j], MjJointType::Hinge | MjJointType::Slide)
                    };
                    scalar(o1) && (o2 == NO_OBJECT || scalar(o2))
                }
                EqualityType::Tendon => {
                    o1 < self.ntendon && (o2 == NO_OBJECT || o2 < self.ntendon)
                }
            };
            if !ok {
                return Err(SimError::invalid_model(format!(
                    "equality {e} ({:?}) references invalid objects ({o1}, {o2})",
                    self.eq_type[e]
                )));
            }
        }
        Ok(())
    }

    fn normalize_joint_axes(&mut self) {
        for j in 0..self.njnt {
            if !matches!(self.jnt_type[j], MjJointType::Hinge | MjJointType::Slide) {
                continue;
            }
            let (axis, norm) = normalize_axis(&self.jnt_axis[j]);
            if norm == 0.0 {
                tracing::warn!(joint = j, "zero-length joint axis, using x axis");
            }
            self.jnt_axis[j] = axis;
        }
    }

    /// Fill `body_jnt_*` and `body_dof_*` from the joint list.
    pub fn compute_body_addresses(&mut self) {
        self.body_jnt_adr = vec![self.njnt; self.nbody];
        self.body_jnt_num = vec![0; self.nbody];
        self.body_dof_adr = vec![self.nv; self.nbody];
        self.body_dof_num = vec![0; self.nbody];
        for j in 0..self.njnt {
            let b = self.jnt_body[j];
            if self.body_jnt_num[b] == 0 {
                self.body_jnt_adr[b] = j;
                self.body_dof_adr[b] = self.jnt_dof_adr[j];
            }
            self.body_jnt_num[b] += 1;
            self.body_dof_num[b] += self.jnt_type[j].nv();
        }
    }

    /// Link each DOF to the previous DOF on its body, or to the last DOF of
    /// the nearest ancestor body that has one.
    pub fn compute_dof_parents(&mut self) {
        let mut last_dof: Vec<Option<usize>> = vec![None; self.nbody];
        for b in 1..self.nbody {
            let mut prev = last_dof[self.body_parent[b]];
            let adr = self.body_dof_adr[b];
            for dof in adr..adr + self.body_dof_num[b] {
                self.dof_parent[dof] = prev;
                prev = Some(dof);
            }
            last_dof[b] = prev;
        }
    }

    /// Per-body list of every DOF that moves the body.
    ///
    /// Parents precede children and joints are body-ordered, so appending a
    /// body's own DOFs to its parent's chain keeps the chain sorted.
    pub fn compute_body_chains(&mut self) {
        self.body_chain_adr = vec![0; self.nbody];
        self.body_chain_num = vec![0; self.nbody];
        self.body_chain.clear();
        for b in 1..self.nbody {
            let parent = self.body_parent[b];
            let (padr, pnum) = (self.body_chain_adr[parent], self.body_chain_num[parent]);
            let adr = self.body_chain.len();
            self.body_chain.extend_from_within(padr..padr + pnum);
            let dof_adr = self.body_dof_adr[b];
            self.body_chain.extend(dof_adr..dof_adr + self.body_dof_num[b]);
            self.body_chain_adr[b] = adr;
            self.body_chain_num[b] = self.body_chain.len() - adr;
        }
    }

    /// Per-tendon sorted unique DOF pattern.
    pub fn compute_tendon_dofs(&mut self) {
        self.tendon_dof_adr = Vec::with_capacity(self.ntendon);
        self.tendon_dof_num = Vec::with_capacity(self.ntendon);
        self.tendon_dofs.clear();
        for t in 0..self.ntendon {
            let adr = self.tendon_adr[t];
            let mut dofs: Vec<usize> = (adr..adr + self.tendon_num[t])
                .filter(|&w| self.wrap_coef[w] != 0.0)
                .map(|w| self.jnt_dof_adr[self.wrap_jnt[w]])
                .collect();
            dofs.sort_unstable();
            dofs.dedup();
            self.tendon_dof_adr.push(self.tendon_dofs.len());
            self.tendon_dof_num.push(dofs.len());
            self.tendon_dofs.extend(dofs);
        }
    }

    /// Tendon reference lengths and the `qpos0`-dependent equality anchors.
    fn compute_reference_quantities(&mut self) {
        let mut data = Data::new(self);
        mj_fwd_position(self, &mut data);
        self.tendon_length0.clone_from(&data.ten_length);

        for e in 0..self.neq {
            let (b1, b2) = (self.eq_obj1id[e], self.eq_obj2id[e]);
            match self.eq_type[e] {
                EqualityType::Connect => {
                    let anchor1 = Vector3::from_column_slice(&self.eq_data[e][0..3]);
                    let world = data.xpos[b1] + data.xquat[b1] * anchor1;
                    let anchor2 = data.xquat[b2].inverse() * (world - data.xpos[b2]);
                    self.eq_data[e][3..6].copy_from_slice(anchor2.as_slice());
                }
                EqualityType::Weld => {
                    let relquat = &self.eq_data[e][6..10];
                    if relquat.iter().any(|&v| v != 0.0) {
                        continue;
                    }
                    let anchor2 = Vector3::from_column_slice(&self.eq_data[e][0..3]);
                    let world = data.xpos[b2] + data.xquat[b2] * anchor2;
                    let relpos = data.xquat[b1].inverse() * (world - data.xpos[b1]);
                    let relquat = data.xquat[b1].inverse() * data.xquat[b2];
                    self.eq_data[e][3..6].copy_from_slice(relpos.as_slice());
                    self.eq_data[e][6..10]
                        .copy_from_slice(&[relquat.w, relquat.i, relquat.j, relquat.k]);
                }
                EqualityType::Joint | EqualityType::Tendon => {}
            }
        }
    }

    /// Relative quaternion stored for weld `eq_id`.
    #[must_use]
    pub fn weld_relquat(&self, eq_id: usize) -> UnitQuaternion<f64> {
        let d = &self.eq_data[eq_id];
        UnitQuaternion::new_normalize(Quaternion::new(d[6], d[7], d[8], d[9]))
    }
}
