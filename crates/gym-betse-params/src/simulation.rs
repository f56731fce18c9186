//! The contract between an episode and the simulator it drives.

use serde_yaml::Value;

use crate::error::ParamError;
use crate::working::WorkingDocument;

/// A simulator that runs from a configuration document on disk.
pub trait Simulation {
    type Error: std::error::Error + Send + Sync + 'static;

    /// (Re)load the configuration at `config`.
    fn load(&mut self, config: &std::path::Path) -> Result<(), Self::Error>;
    /// Restart from the initial state of the loaded configuration.
    fn reset(&mut self) -> Result<(), Self::Error>;
    /// Run the simulation forward by one step.
    fn advance(&mut self) -> Result<(), Self::Error>;
    fn current_observation(&self) -> Vec<f64>;
    fn is_terminal(&self) -> bool;
    fn close(&mut self) -> Result<(), Self::Error>;
}

#[derive(thiserror::Error, Debug)]
pub enum EpisodeError<E> {
    #[error(transparent)]
    Params(#[from] ParamError),
    #[error("Simulation failed: {0}")]
    Simulation(#[source] E),
    #[error("Episode has already finished")]
    Finished,
}

/// Outcome of one episode step.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub observation: Vec<f64>,
    pub terminal: bool,
}

/// Drives a simulation through a working copy of a configuration template.
///
/// Every action is a set of parameter values written at fixed keys before
/// the simulation is reloaded and advanced.
pub struct Episode<S: Simulation> {
    simulation: S,
    document: WorkingDocument,
    keys: Vec<String>,
    finished: bool,
}

impl<S: Simulation> Episode<S> {
    pub fn new(simulation: S, document: WorkingDocument, keys: Vec<String>) -> Self {
        Self {
            simulation,
            document,
            keys,
            finished: false,
        }
    }

    pub fn document(&self) -> &WorkingDocument {
        &self.document
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    /// Load the working copy and return the first observation.
    pub fn reset(&mut self) -> Result<Vec<f64>, EpisodeError<S::Error>> {
        self.simulation
            .load(self.document.path())
            .map_err(EpisodeError::Simulation)?;
        self.simulation.reset().map_err(EpisodeError::Simulation)?;
        self.finished = false;
        Ok(self.simulation.current_observation())
    }

    /// Apply `values`, reload, advance one step and observe.
    pub fn step(&mut self, values: &[Value]) -> Result<Step, EpisodeError<S::Error>> {
        if self.finished {
            return Err(EpisodeError::Finished);
        }
        self.document.apply(self.keys.as_slice(), values)?;
        self.simulation
            .load(self.document.path())
            .map_err(EpisodeError::Simulation)?;
        self.simulation.advance().map_err(EpisodeError::Simulation)?;

        let terminal = self.simulation.is_terminal();
        self.finished = terminal;
        Ok(Step {
            observation: self.simulation.current_observation(),
            terminal,
        })
    }

    /// Shut the simulation down and delete the working copy.
    pub fn close(mut self) -> Result<(), EpisodeError<S::Error>> {
        self.simulation.close().map_err(EpisodeError::Simulation)?;
        self.document.release()?;
        Ok(())
    }
}
