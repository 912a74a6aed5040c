//! Unfold CLI - LSCM parameterization from the command line.
//!
//! Usage: unfold <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `unfold --help` for available commands. Set `RUST_LOG=debug` to see
//! the solver pipeline.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use unfold::algo::parameterize::{
    angle_distortion, conformal_energy, connected_components, flipped_faces, lscm, lscm_atlas,
    AtlasOptions, BorderStrategy, ChartStatus, LscmOptions, UVMap,
};
use unfold::io;
use unfold::linalg::{ConjugateGradientSolver, DenseSvdSolver};
use unfold::mesh::{triangulate, HalfEdgeMesh};

#[derive(Parser)]
#[command(name = "unfold")]
#[command(author, version, about = "LSCM mesh parameterization CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Compute a least squares conformal map and save it as OBJ with UVs
    Lscm {
        /// Input mesh file
        input: PathBuf,

        /// Output OBJ file
        output: PathBuf,

        /// How the pinned boundary vertices are chosen
        #[arg(short, long, value_enum, default_value = "two-vertices")]
        border: BorderMethod,

        /// Linear solver backend
        #[arg(short, long, value_enum, default_value = "jacobi-cg")]
        solver: SolverMethod,

        /// Conjugate gradient iteration cap
        #[arg(long, default_value = "10000")]
        max_iterations: usize,

        /// Conjugate gradient relative residual target
        #[arg(long, default_value = "1e-10")]
        tolerance: f64,

        /// Keep raw solver coordinates instead of fitting into the unit square
        #[arg(long)]
        no_normalize: bool,

        /// Parameterize every connected component and pack them side by side
        #[arg(long)]
        atlas: bool,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,

        /// Split polygon faces into triangles before solving
        #[arg(long)]
        triangulate: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum BorderMethod {
    /// Pin the two extreme vertices along the longest bounding box axis
    TwoVertices,
    /// Pin the two boundary vertices farthest apart
    FarthestPair,
    /// Pin the whole boundary loop to the unit circle
    Circular,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SolverMethod {
    /// Conjugate gradient
    Cg,
    /// Jacobi-preconditioned conjugate gradient
    JacobiCg,
    /// Dense SVD (small meshes only)
    Svd,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Lscm {
            input,
            output,
            border,
            solver,
            max_iterations,
            tolerance,
            no_normalize,
            atlas,
            sequential,
            triangulate,
        } => {
            let border = match border {
                BorderMethod::TwoVertices => BorderStrategy::TwoVertices,
                BorderMethod::FarthestPair => BorderStrategy::FarthestPair,
                BorderMethod::Circular => BorderStrategy::Circular,
            };
            let cg = ConjugateGradientSolver::default()
                .with_max_iterations(max_iterations)
                .with_tolerance(tolerance);
            let options = LscmOptions::default()
                .with_border(border)
                .with_normalize(!no_normalize);
            let options = match solver {
                SolverMethod::Cg => options.with_solver(cg.with_preconditioner(false)),
                SolverMethod::JacobiCg => options.with_solver(cg),
                SolverMethod::Svd => options.with_solver(DenseSvdSolver::default()),
            };

            cmd_lscm(&input, &output, options, atlas, sequential, triangulate)?;
        }
    }

    Ok(())
}

fn cmd_info(input: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Half-edges: {}", mesh.num_halfedges());
    println!("Surface area: {:.6}", mesh.surface_area());

    if let Some((min, max)) = mesh.bounding_box() {
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    if mesh.is_triangle_mesh() {
        println!("Mesh type: Triangle mesh");
    } else {
        println!("Mesh type: Polygon mesh (use --triangulate for lscm)");
    }

    let components = connected_components(&mesh);
    println!("Components: {}", components.len());

    // Count holes by walking each boundary loop once
    let mut seen = vec![false; mesh.num_halfedges()];
    let mut loops = Vec::new();
    for start in mesh.boundary_halfedges() {
        if seen[start.index()] {
            continue;
        }
        let mut length = 0;
        for he in mesh.boundary_loop(start) {
            seen[he.index()] = true;
            length += 1;
        }
        loops.push(length);
    }

    if loops.is_empty() {
        println!("Topology: Closed (no boundary, cannot be flattened without cuts)");
    } else {
        println!("Boundary loops: {} (lengths {:?})", loops.len(), loops);
    }

    Ok(())
}

fn cmd_lscm(
    input: &PathBuf,
    output: &PathBuf,
    options: LscmOptions,
    atlas: bool,
    sequential: bool,
    triangulate_faces: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: HalfEdgeMesh = io::load(input)?;
    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    if triangulate_faces && !mesh.is_triangle_mesh() {
        mesh = triangulate(&mesh)?;
        println!("Triangulated: {} faces", mesh.num_faces());
    }

    let solver = options.solver.name();
    let start = Instant::now();
    let uv: UVMap = if atlas {
        let mode = if sequential { "sequential" } else { "parallel" };
        println!("Computing LSCM atlas ({}, {})...", solver, mode);

        let result = lscm_atlas(
            &mesh,
            &AtlasOptions::default()
                .with_lscm(options)
                .with_parallel(!sequential),
        )?;
        for (i, chart) in result.charts.iter().enumerate() {
            match &chart.status {
                ChartStatus::Parameterized { iterations, .. } => println!(
                    "  chart {}: {} faces, {} iterations",
                    i,
                    chart.faces.len(),
                    iterations
                ),
                ChartStatus::Closed => {
                    println!("  chart {}: {} faces, closed (skipped)", i, chart.faces.len())
                }
                ChartStatus::Failed(e) => {
                    println!("  chart {}: {} faces, failed: {}", i, chart.faces.len(), e)
                }
            }
        }
        println!(
            "Parameterized {} of {} charts",
            result.num_parameterized(),
            result.charts.len()
        );
        result.uv
    } else {
        println!("Computing LSCM ({})...", solver);
        lscm(&mesh, &options).map_err(|e| {
            if e.is_parameterization_failure() {
                eprintln!("Hint: try another --border or --solver svd on small meshes");
            }
            e
        })?
    };
    let elapsed = start.elapsed();

    println!("Conformal energy: {:.6e}", conformal_energy(&mesh, &uv));
    println!("Angle distortion: {:.4} rad", angle_distortion(&mesh, &uv));
    println!("Flipped faces: {}", flipped_faces(&mesh, &uv));
    if let Some((min, max)) = uv.bounding_box() {
        println!(
            "UV bounds: ({:.3}, {:.3}) to ({:.3}, {:.3})",
            min.x, min.y, max.x, max.y
        );
    }

    io::obj::save_with_uvs(&mesh, &uv, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}
