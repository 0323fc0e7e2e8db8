use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use crew_domain::{EmploymentType, StationName};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "crew")]
#[command(about = "CrewFlow operations CLI")]
pub struct Cli {
    #[arg(long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Applicants {
        #[command(subcommand)]
        command: ApplicantCommand,
    },
    Stations {
        #[command(subcommand)]
        command: StationCommand,
    },
    Products {
        #[command(subcommand)]
        command: ProductCommand,
    },
    Categories {
        #[command(subcommand)]
        command: CategoryCommand,
    },
    Otp {
        #[command(subcommand)]
        command: OtpCommand,
    },
    Note {
        #[command(subcommand)]
        command: NoteCommand,
    },
    /// Conteos del tablero y postulantes recientes.
    Summary {
        #[arg(long)]
        recent: Option<usize>,
    },
    /// Datos del gráfico de certificaciones.
    Chart {
        #[arg(long, conflicts_with = "station")]
        employee: Option<Uuid>,
        #[arg(long)]
        station: Option<StationName>,
    },
}

#[derive(Debug, Args)]
pub struct StepArgs {
    pub id: Uuid,
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ApplicantCommand {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long = "type", default_value = "working-student")]
        employment_type: EmploymentType,
    },
    Promote(StepArgs),
    Demote(StepArgs),
    Cancel(StepArgs),
    Deploy(StepArgs),
    History {
        id: Uuid,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Debug, Subcommand)]
pub enum StationCommand {
    List {
        #[arg(long)]
        employee: Option<Uuid>,
    },
    Add {
        #[arg(long)]
        employee: Uuid,
        #[arg(long)]
        station: Option<StationName>,
    },
    Promote(StepArgs),
    Demote(StepArgs),
}

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        mp: f64,
        #[arg(long)]
        sp: f64,
        #[arg(long)]
        pt: f64,
        #[arg(long)]
        mc: Option<String>,
        #[arg(long)]
        cc: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    List,
    Add {
        #[arg(long)]
        label: String,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Debug, Subcommand)]
pub enum OtpCommand {
    Issue {
        #[arg(long)]
        email: String,
    },
    Verify {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
    },
    /// Cambia la contraseña tras verificar un código.
    Reset {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum NoteCommand {
    Show,
    Set {
        text: String,
    },
}
