use perfsuite_device::{MemorySpace, Real, init_data, init_scalar};
use perfsuite_runtime::{VariantId, calc_checksum};

use crate::KernelId;
use crate::basic::daxpy;
use crate::lcals::hydro_1d;
use crate::test::{base_seq_checksum, run_one, small_params};

// small_params: size factor 1e-3 on a default size of 1e6, rep factor 1e-2.
const N: usize = 1000;

#[test]
fn test_daxpy_reference() {
    let report = run_one(KernelId::BasicDaxpy, small_params(MemorySpace::Device));
    let reps = report.record("Basic_DAXPY", VariantId::BaseSeq, "default").unwrap().reps;
    assert_eq!(reps, 5);

    let x = init_data(N, daxpy::X_FACTOR);
    let a = init_scalar(daxpy::A_FACTOR);
    let mut y = vec![0.0; N];
    for _ in 0..reps {
        for i in 0..N {
            y[i] += a * x[i];
        }
    }
    assert_eq!(base_seq_checksum(&report, KernelId::BasicDaxpy), calc_checksum(&y, 1.0));
}

#[test]
fn test_init_view_kernels_agree() {
    let plain = run_one(KernelId::BasicInitView1d, small_params(MemorySpace::Device));
    let offset = run_one(KernelId::BasicInitView1dOffset, small_params(MemorySpace::Device));

    let expected: Vec<Real> = (0..N).map(|i| (i + 1) as Real * 0.00000123).collect();
    let expected = calc_checksum(&expected, 1.0);
    assert_eq!(base_seq_checksum(&plain, KernelId::BasicInitView1d), expected);
    assert_eq!(base_seq_checksum(&offset, KernelId::BasicInitView1dOffset), expected);
}

#[test]
fn test_nested_init_reference() {
    let report = run_one(KernelId::BasicNestedInit, small_params(MemorySpace::Managed));

    let edge = 10;
    let mut expected = Vec::with_capacity(edge * edge * edge);
    for k in 0..edge {
        for j in 0..edge {
            for i in 0..edge {
                expected.push(0.00000001 * i as Real * j as Real * k as Real);
            }
        }
    }
    assert_eq!(base_seq_checksum(&report, KernelId::BasicNestedInit), calc_checksum(&expected, 1.0));
}

#[test]
fn test_gemm_problem_size() {
    let report = run_one(KernelId::PolybenchGemm, small_params(MemorySpace::Device));
    // sqrt(1e-3) * 1000 rounds to a 32-wide square.
    for record in report.records() {
        assert_eq!(record.problem_size, 32 * 32);
        assert_eq!(record.reps, 1);
    }
}

#[test]
fn test_hydro_1d_reference() {
    let report = run_one(KernelId::LcalsHydro1d, small_params(MemorySpace::Pinned));

    let y = init_data(N, hydro_1d::Y_FACTOR);
    let z = init_data(N + 12, hydro_1d::Z_FACTOR);
    let (q, r, t) =
        (init_scalar(hydro_1d::Q_FACTOR), init_scalar(hydro_1d::R_FACTOR), init_scalar(hydro_1d::T_FACTOR));
    let x: Vec<Real> = (0..N).map(|i| q + y[i] * (r * z[i + 10] + t * z[i + 11])).collect();

    assert_eq!(base_seq_checksum(&report, KernelId::LcalsHydro1d), calc_checksum(&x, 1.0));
}
