//! Noisy Bell State
//!
//! Prepares a Bell pair under a depolarizing CNOT and readout error, then
//! compares exact density-matrix probabilities with trajectory sampling.
//!
//! Usage:
//! ```bash
//! cargo run --example noisy_bell --release
//! ```

use tnsim_backend::prelude::*;

fn noise_model() -> SimResult<NoiseChannelModel> {
    Ok(NoiseChannelModel::ideal()
        .with_channel(NoiseChannel::depolarizing("H", 0, 0.01)?)
        .with_channel(NoiseChannel::amplitude_damping("X", 1, 0.05)?)
        .with_readout_error(ReadoutErrorRecord::new(0, 0.02, 0.04)?)
        .with_readout_error(ReadoutErrorRecord::new(1, 0.02, 0.04)?))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              TNSim Noisy Bell State                          ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let circuit: Vec<Instruction> = vec![
        Gate::H(0).into(),
        Gate::Cnot(0, 1).into(),
        Gate::X(1).into(),
        Gate::Measure(0).into(),
        Gate::Measure(1).into(),
    ];
    let model = noise_model()?;

    // Exact: density matrix on a 2n-site ring
    let exact = TensorNetworkSimulator::ideal()
        .with_noise_model(model.clone())
        .run(2, &circuit)?;
    let rho = exact.density_matrix()?;
    println!("Density matrix: trace={:.6}, purity={:.6}", rho.trace().re, rho.purity());

    println!("\n┌──────────┬────────────┬────────────┐");
    println!("│ Outcome  │ Exact      │ Trajectory │");
    println!("├──────────┼────────────┼────────────┤");

    let shots = 2000;
    let sampled = TensorNetworkSimulator::new(VisitorConfig::trajectory(7))
        .with_noise_model(model)
        .execute(2, &circuit, shots)?;

    for (outcome, p) in exact.measurement_distribution()? {
        println!(
            "│ {:8} │ {:10.4} │ {:10.4} │",
            outcome,
            p,
            sampled.probability(&outcome)
        );
    }
    println!("└──────────┴────────────┴────────────┘");

    println!("\n{}", sampled);
    for warning in &sampled.metadata.warnings {
        println!("⚠ {}", warning);
    }

    Ok(())
}
