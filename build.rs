fn main() {
    println!("cargo:rerun-if-env-changed=MPICC");

    #[cfg(feature = "mpi")]
    export_mpi_version();
}

#[cfg(feature = "mpi")]
fn export_mpi_version() {
    // `mpi-sys` fails the build on its own if no library is found, so only
    // warn here.
    let lib = match build_probe_mpi::probe() {
        Ok(lib) => lib,
        Err(errs) => {
            for (i, err) in errs.iter().enumerate() {
                println!("cargo:warning=MPI lookup #{} failed: {}", i, err);
            }
            return;
        }
    };

    // Logged when the MPI backend joins.
    println!("cargo:rustc-env=MPI_REPORTER_MPI_VERSION={}", lib.version);
}
