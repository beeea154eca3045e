//! The Driver role (§6 Driver API): the client-facing top-level entry
//! point. Owns the `Runtime`, starts/stops the `HostController`, and
//! turns each Driver API call into the host's three-phase protocol.

use std::collections::HashMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::instrument;

use crate::config::Config;
use crate::control::host::HostController;
use crate::dataset::FileType;
use crate::error::Status;
use crate::geometry::{DataType, Mbr, Shape};
use crate::io;
use crate::partition::{classify_shape, Grid, PartitioningMethod};
use crate::query::{targets_for, EvalOptions, Query, QueryResult, ResultType, Targets};
use crate::runtime::Runtime;

struct DatasetMeta {
    data_type: DataType,
    file_type: FileType,
    path: String,
    dataspace: Mbr,
    grid: Option<Grid>,
}

/// The Driver: one per client process, wrapping exactly one cluster.
pub struct Driver {
    runtime: Runtime,
    host: HostController,
    world_size: u32,
    datasets: HashMap<u64, DatasetMeta>,
}

impl Driver {
    /// init (§6): validate configuration and stand up the cluster —
    /// the Host Controller's own Agent plus one Worker Controller per
    /// remaining rank.
    pub fn init(config: Config) -> Result<Self, Status> {
        config.validate()?;
        let world_size = config.cluster.worker_count;
        let runtime = Runtime::new(config);
        let host = HostController::start(world_size);
        Ok(Driver {
            runtime,
            host,
            world_size,
            datasets: HashMap::new(),
        })
    }

    /// finalize (§6, §4.1 "Termination"): FIN broadcasts down the
    /// tree, every Agent releases its datasets, every worker thread is
    /// joined.
    pub fn finalize(self) {
        self.host.finalize();
    }

    #[instrument(skip(self))]
    pub fn prepare_dataset(
        &mut self,
        path: &str,
        file_type: FileType,
        data_type: DataType,
        dataspace: Option<Mbr>,
    ) -> Result<u64, Status> {
        let internal_id = self.runtime.next_id();
        let dataspace = match dataspace {
            Some(mbr) => mbr,
            None => infer_dataspace(path, file_type, data_type)?,
        };
        self.host.prepare_dataset(
            internal_id,
            &format!("dataset-{internal_id}"),
            data_type,
            file_type,
            path,
            dataspace,
        )?;
        self.datasets.insert(
            internal_id,
            DatasetMeta {
                data_type,
                file_type,
                path: path.to_string(),
                dataspace,
                grid: None,
            },
        );
        Ok(internal_id)
    }

    pub fn unload_dataset(&mut self, dataset_id: u64) -> Result<(), Status> {
        self.host.unload(dataset_id)?;
        self.datasets.remove(&dataset_id);
        Ok(())
    }

    /// partition (§6, §4.4): read each dataset's backing file,
    /// classify every shape against a fresh grid, and stream the
    /// owner-grouped result down to the Worker Controllers.
    pub fn partition(
        &mut self,
        dataset_ids: &[u64],
        method: PartitioningMethod,
        dist_ppd: u32,
        part_ppd: u32,
        batch_size: usize,
    ) -> Result<(), Status> {
        for &dataset_id in dataset_ids {
            let meta = self
                .datasets
                .get(&dataset_id)
                .ok_or(Status::MissingMetadata(dataset_id))?;
            let grid = Grid::new(meta.dataspace, method, dist_ppd, part_ppd)?;
            let mut shapes = io::reader_for(meta.file_type)?.read_all(Path::new(&meta.path), meta.data_type)?;
            for shape in &mut shapes {
                classify_shape(&grid, shape)?;
            }
            let per_rank = group_by_owner(&grid, self.world_size, shapes);
            self.host.partition(dataset_id, &grid, per_rank)?;
            let _ = batch_size; // batching onto the wire is Batch's concern (§4.4); see partition::distribute
            self.datasets.get_mut(&dataset_id).unwrap().grid = Some(grid);
        }
        Ok(())
    }

    pub fn build_index(&mut self, dataset_ids: &[u64]) -> Result<(), Status> {
        for &dataset_id in dataset_ids {
            self.host.build_index(dataset_id)?;
        }
        Ok(())
    }

    /// query (§6): dispatch to the ranks that actually need to see it
    /// and merge the partials into one `QueryResult`.
    pub fn query(&mut self, query: Query) -> Result<QueryResult, Status> {
        let targets = self.targets_for(&query);
        let opts = EvalOptions {
            intermediate_filter: self.runtime.config.query.intermediate_filter,
            refinement: self.runtime.config.query.refinement,
        };
        self.host.query(query, opts, targets)
    }

    /// queryBatch (§6): a homogeneous sequence of queries, each
    /// dispatched independently and keyed by its own `queryId`.
    pub fn query_batch(&mut self, queries: Vec<Query>) -> Result<HashMap<u32, QueryResult>, Status> {
        let mut out = HashMap::with_capacity(queries.len());
        for query in queries {
            let query_id = query.query_id();
            let result = self.query(query)?;
            out.insert(query_id, result);
        }
        Ok(out)
    }

    /// loadRangeQueriesFromFile (§6): read one window per CSV row
    /// (`xMin,yMin,xMax,yMax`) and turn it into a Range query against
    /// `dataset_id`.
    pub fn load_range_queries_from_file(&mut self, path: &str, dataset_id: u64, result_type: ResultType) -> Result<Vec<Query>, Status> {
        let text = std::fs::read_to_string(path).map_err(|e| Status::Io(e.to_string()))?;
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|line| {
                let parts: Vec<f64> = line
                    .split(',')
                    .map(|p| p.trim().parse().map_err(|_| Status::InvalidQueryInput(line.to_string())))
                    .collect::<Result<_, _>>()?;
                if parts.len() != 4 {
                    return Err(Status::InvalidQueryInput(line.to_string()));
                }
                Ok(Query::Range {
                    query_id: self.runtime.next_id() as u32,
                    dataset_id,
                    window: Mbr::new(parts[0], parts[1], parts[2], parts[3]),
                    result_type,
                })
            })
            .collect()
    }

    /// loadKNNQueriesFromFile (§6): read one point per CSV row
    /// (`x,y`) and turn it into a kNN query against `dataset_id`.
    pub fn load_knn_queries_from_file(&mut self, path: &str, dataset_id: u64, k: usize) -> Result<Vec<Query>, Status> {
        let text = std::fs::read_to_string(path).map_err(|e| Status::Io(e.to_string()))?;
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|line| {
                let parts: Vec<f64> = line
                    .split(',')
                    .map(|p| p.trim().parse().map_err(|_| Status::InvalidQueryInput(line.to_string())))
                    .collect::<Result<_, _>>()?;
                if parts.len() != 2 {
                    return Err(Status::InvalidQueryInput(line.to_string()));
                }
                Ok(Query::Knn {
                    query_id: self.runtime.next_id() as u32,
                    dataset_id,
                    point: (parts[0], parts[1]),
                    k,
                })
            })
            .collect()
    }

    /// time.now (§6): seconds since the epoch, as a double.
    pub fn now() -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }

    fn targets_for(&self, query: &Query) -> Targets {
        let dataset_id = match query {
            Query::Range { dataset_id, .. } | Query::Knn { dataset_id, .. } => *dataset_id,
            Query::Join { .. } => return Targets::All,
        };
        match self.datasets.get(&dataset_id).and_then(|m| m.grid.as_ref()) {
            Some(grid) => targets_for(query, grid, self.world_size),
            None => Targets::All,
        }
    }
}

fn infer_dataspace(path: &str, file_type: FileType, data_type: DataType) -> Result<Mbr, Status> {
    let shapes = io::reader_for(file_type)?.read_all(Path::new(path), data_type)?;
    union_mbr(&shapes).ok_or_else(|| Status::InvalidGeometry)
}

fn union_mbr(shapes: &[Shape]) -> Option<Mbr> {
    shapes.iter().fold(None, |acc: Option<Mbr>, shape| {
        Some(match acc {
            None => shape.mbr,
            Some(prev) => Mbr::new(
                prev.x_min.min(shape.mbr.x_min),
                prev.y_min.min(shape.mbr.y_min),
                prev.x_max.max(shape.mbr.x_max),
                prev.y_max.max(shape.mbr.y_max),
            ),
        })
    })
}

fn group_by_owner(grid: &Grid, world_size: u32, shapes: Vec<Shape>) -> HashMap<u32, Vec<Shape>> {
    let mut per_rank: HashMap<u32, Vec<Shape>> = HashMap::new();
    for shape in shapes {
        let mut owners: Vec<u32> = shape.partitions.iter().map(|&(cell_id, _)| grid.owner(cell_id, world_size)).collect();
        owners.sort_unstable();
        owners.dedup();
        for owner in owners {
            per_rank.entry(owner).or_default().push(shape.clone());
        }
    }
    per_rank
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config(worker_count: u32) -> Config {
        Config::default().with_worker_count(worker_count)
    }

    #[test]
    fn end_to_end_prepare_partition_build_query() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "POLYGON ((1 1, 5 1, 5 5, 1 5, 1 1))").unwrap();
        writeln!(file, "POLYGON ((20 20, 25 20, 25 25, 20 25, 20 20))").unwrap();

        let mut driver = Driver::init(config(1)).unwrap();
        let dataset_id = driver
            .prepare_dataset(
                file.path().to_str().unwrap(),
                FileType::Wkt,
                DataType::Polygon,
                Some(Mbr::new(0.0, 0.0, 30.0, 30.0)),
            )
            .unwrap();
        driver
            .partition(&[dataset_id], PartitioningMethod::RoundRobin, 2, 1, 1024)
            .unwrap();
        driver.build_index(&[dataset_id]).unwrap();

        let result = driver
            .query(Query::Range {
                query_id: 0,
                dataset_id,
                window: Mbr::new(0.0, 0.0, 10.0, 10.0),
                result_type: ResultType::Count,
            })
            .unwrap();
        assert_eq!(result, QueryResult::Count(1));

        driver.unload_dataset(dataset_id).unwrap();
        driver.finalize();
    }

    #[test]
    fn now_is_a_positive_timestamp() {
        assert!(Driver::now() > 0.0);
    }
}
