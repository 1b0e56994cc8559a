//! Jacobian preallocation across dense and sparse storage.
//!
//! Every fixture is assembled with both storages. The sparse Jacobian must
//! be allocated at exactly its final size, every row must hold exactly the
//! DOFs of the constrained objects, and both storages must describe the
//! same matrix. Fixtures include constraints with no DOFs at all (static
//! bodies, empty tendons), which must still produce rows.

use approx::assert_relative_eq;
use sim_conformance_tests::assemble_fixture;
use sim_core::{
    ConeType, ConstraintFixture, ConstraintJacobian, ConstraintOptions, ConstraintType,
    JacobianRow,
};

#[test]
fn test_all_fixtures_assemble_dense_and_sparse() {
    for fixture in ConstraintFixture::ALL {
        let (_, dense) = assemble_fixture(fixture, &ConstraintOptions::dense());
        let (model, sparse) = assemble_fixture(fixture, &ConstraintOptions::sparse());

        assert_eq!(dense.nefc, fixture.expected_nefc(), "{}", fixture.name());
        assert_eq!(sparse.nefc, fixture.expected_nefc(), "{}", fixture.name());
        assert_eq!(dense.efc_J.nrows(), dense.nefc);
        assert_eq!(dense.efc_J.ncols(), model.nv);
        assert!(!dense.efc_J.is_sparse());
        assert!(sparse.efc_J.is_sparse());

        assert_eq!(dense.efc_type, sparse.efc_type, "{}", fixture.name());
        assert_eq!(dense.efc_id, sparse.efc_id);
        assert_eq!(dense.efc_pos, sparse.efc_pos);
        assert_eq!(dense.efc_margin, sparse.efc_margin);
        assert_eq!(dense.efc_frictionloss, sparse.efc_frictionloss);
        assert_relative_eq!(dense.efc_J.to_dense(), sparse.efc_J.to_dense(), epsilon = 1e-14);
    }
}

#[test]
fn test_sparse_storage_is_exact() {
    for fixture in ConstraintFixture::ALL {
        let (model, data) = assemble_fixture(fixture, &ConstraintOptions::sparse());
        let ConstraintJacobian::Sparse(jac) = &data.efc_J else {
            panic!("{}: expected sparse Jacobian", fixture.name());
        };
        let total: usize = jac.rownnz.iter().sum();
        assert_eq!(jac.nnz(), total);
        assert_eq!(jac.colind.capacity(), total, "{}", fixture.name());
        assert_eq!(jac.values.capacity(), total);
        for i in 0..jac.nrows() {
            let row = jac.row(i);
            assert!(row.indices.windows(2).all(|w| w[0] < w[1]));
            assert!(row.indices.iter().all(|&d| d < model.nv));
            if i + 1 < jac.nrows() {
                assert_eq!(jac.rowadr[i + 1], jac.rowadr[i] + jac.rownnz[i]);
            }
        }
    }
}

#[test]
fn test_dofless_constraints_emit_zero_rows() {
    let (_, dense) = assemble_fixture(ConstraintFixture::DoflessWeld, &ConstraintOptions::dense());
    assert_eq!(dense.ne, 6);
    assert!(dense.efc_J.to_dense().iter().all(|&v| v == 0.0));
    assert!(dense.efc_pos.iter().all(|&p| p.abs() < 1e-15));

    let (_, sparse) = assemble_fixture(ConstraintFixture::DoflessWeld, &ConstraintOptions::sparse());
    let ConstraintJacobian::Sparse(jac) = &sparse.efc_J else {
        panic!("expected sparse Jacobian");
    };
    assert_eq!(jac.rownnz, vec![0; 6]);
    assert_eq!(jac.nnz(), 0);
}

#[test]
fn test_dofless_tendons() {
    let (_, d) = assemble_fixture(
        ConstraintFixture::DoflessTendonFrictional,
        &ConstraintOptions::sparse(),
    );
    assert_eq!(d.nf, 2);
    assert_eq!(d.efc_type, vec![ConstraintType::FrictionTendon; 2]);
    assert_eq!(d.efc_frictionloss, vec![0.1, 0.2]);
    assert_eq!(d.efc_J.row(0).nnz(), 0);
    assert_eq!(d.efc_J.row(1).nnz(), 1);
    assert_eq!(d.efc_J.row(1).value_at(0), 1.0);

    let (_, d) = assemble_fixture(ConstraintFixture::DoflessTendonLimited, &ConstraintOptions::dense());
    assert_eq!(d.nl, 1);
    assert_eq!(d.efc_pos, vec![-0.5]);

    let (_, d) = assemble_fixture(
        ConstraintFixture::DoflessTendonLimitedMargin,
        &ConstraintOptions::sparse(),
    );
    assert_eq!(d.nl, 2);
    assert_eq!(d.efc_margin, vec![0.2, 0.2]);
    assert_relative_eq!(d.efc_pos[0], 0.1);
    assert_relative_eq!(d.efc_pos[1], 0.1);
}

#[test]
fn test_bilateral_margin_limits() {
    let (_, d) = assemble_fixture(
        ConstraintFixture::JointLimitedBilateralMargin,
        &ConstraintOptions::sparse(),
    );
    // Hinge: both sides inside the margin. Slide: neither.
    assert_eq!(d.efc_id, vec![0, 0]);
    assert_eq!(d.efc_J.row(0).value_at(0), 1.0);
    assert_eq!(d.efc_J.row(1).value_at(0), -1.0);
    assert_eq!(d.efc_J.row(0).nnz(), 1);

    let (_, d) = assemble_fixture(
        ConstraintFixture::TendonLimitedBilateralMargin,
        &ConstraintOptions::sparse(),
    );
    assert_eq!(d.efc_type, vec![ConstraintType::LimitTendon; 2]);
    let lower = d.efc_J.row(0);
    let upper = d.efc_J.row(1);
    assert_eq!((lower.nnz(), upper.nnz()), (2, 2));
    assert_eq!((lower.value_at(0), lower.value_at(1)), (1.0, -1.0));
    assert_eq!((upper.value_at(0), upper.value_at(1)), (-1.0, 1.0));
}

#[test]
fn test_dofless_contact_rows() {
    let (model, d) = assemble_fixture(ConstraintFixture::DoflessContact, &ConstraintOptions::sparse());
    assert_eq!(model.nv, 6);
    assert_eq!(d.ncon_rows(), 8);
    assert_eq!(d.efc_id, vec![0, 0, 0, 0, 1, 1, 1, 1]);
    for i in 0..4 {
        assert_eq!(d.efc_J.row(i).nnz(), 0);
        assert_eq!(d.efc_pos[i], -0.01);
    }
    for i in 4..8 {
        assert_eq!(d.efc_J.row(i).nnz(), 6);
        assert_eq!(d.efc_pos[i], -0.001);
    }

    let elliptic = ConstraintOptions::sparse().cone(ConeType::Elliptic);
    let (_, d) = assemble_fixture(ConstraintFixture::DoflessContact, &elliptic);
    assert_eq!(d.nefc, 6);
    assert_eq!(d.efc_type, vec![ConstraintType::ContactElliptic; 6]);
    assert_eq!(d.efc_pos, vec![-0.01, 0.0, 0.0, -0.001, 0.0, 0.0]);
}
