//! Network constructors: random G(n, p), complete graphs, and CSV edge lists.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, trace};
use rand::Rng;
use serde::Deserialize;

use crate::error::EpiError;
use crate::network::{Network, NodeId};

#[derive(Deserialize, Debug)]
struct EdgeRecord {
    v1: usize,
    v2: usize,
}

impl Network {
    /// Generates an Erdős–Rényi G(n, p) random graph: each of the `n * (n - 1) / 2`
    /// possible edges is present independently with probability `phi`.
    ///
    /// Uses the geometric skipping method of Batagelj and Brandes, which runs in
    /// time proportional to `n + size` rather than `n²`.
    ///
    /// # Errors
    ///
    /// `EpiError::NetworkError` if `phi` is not a probability.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn erdos_renyi<R: Rng + ?Sized>(
        order: usize,
        phi: f64,
        rng: &mut R,
    ) -> Result<Network, EpiError> {
        if !(0.0..=1.0).contains(&phi) {
            return Err(EpiError::NetworkError(format!(
                "Edge probability must be in [0, 1], got {phi}"
            )));
        }
        if phi >= 1.0 {
            return Ok(Network::complete(order));
        }

        let mut network = Network::with_nodes(order);
        if phi <= 0.0 || order < 2 {
            return Ok(network);
        }

        // ln(1 - phi) without losing a tiny phi to rounding
        let log_q = (-phi).ln_1p();
        if log_q >= 0.0 {
            return Ok(network);
        }
        let pairs = (order as f64) * (order as f64 - 1.0) / 2.0;

        let mut v: usize = 1;
        // `w` runs over the candidate partners of `v`, starting one before 0
        let mut w: i64 = -1;
        while v < order {
            let r: f64 = rng.random();
            let skip = ((1.0 - r).ln() / log_q).floor();
            if !skip.is_finite() || skip >= pairs {
                break;
            }
            w += 1 + skip as i64;
            while v < order && w >= v as i64 {
                w -= v as i64;
                v += 1;
            }
            if v < order {
                network.push_edge(NodeId::new(v), NodeId::new(w as usize));
            }
        }

        debug!(
            "generated G({order}, {phi}) with {} edges, mean degree {:.3}",
            network.size(),
            network.mean_degree()
        );
        Ok(network)
    }

    /// The complete graph on `order` nodes.
    #[must_use]
    pub fn complete(order: usize) -> Network {
        let mut network = Network::with_nodes(order);
        for a in 0..order {
            for b in (a + 1)..order {
                network.push_edge(NodeId::new(a), NodeId::new(b));
            }
        }
        network
    }

    /// Reads a CSV edge list with a `v1,v2` header. The network has `order`
    /// nodes if given, otherwise one more than the largest node index seen.
    ///
    /// # Errors
    ///
    /// `EpiError::CSVError` for malformed rows, `EpiError::NetworkError` for self
    /// loops, duplicate edges or nodes outside `order`.
    pub fn from_edge_list_reader<R: Read>(
        reader: R,
        order: Option<usize>,
    ) -> Result<Network, EpiError> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();
        for result in reader.deserialize() {
            let record: EdgeRecord = result?;
            trace!("read edge {record:?}");
            records.push(record);
        }

        let order = order.unwrap_or_else(|| {
            records
                .iter()
                .map(|record| record.v1.max(record.v2) + 1)
                .max()
                .unwrap_or(0)
        });
        let mut network = Network::with_nodes(order);
        for record in records {
            network.add_edge(NodeId::new(record.v1), NodeId::new(record.v2))?;
        }
        Ok(network)
    }

    /// Loads a CSV edge list from a file. See [`Network::from_edge_list_reader`].
    ///
    /// # Errors
    ///
    /// `EpiError::IoError` if the file cannot be opened, otherwise as
    /// [`Network::from_edge_list_reader`].
    pub fn from_edge_list_csv(path: &Path, order: Option<usize>) -> Result<Network, EpiError> {
        debug!("loading edge list from {}", path.display());
        let file = File::open(path)?;
        Network::from_edge_list_reader(file, order)
    }
}
