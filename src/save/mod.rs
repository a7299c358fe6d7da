use crate::{
    observers::BeamStatistics,
    prtls::{ParticleBatch, DIM},
    Float,
};
use anyhow::{Context, Result};

const COLUMN_NAMES: [&str; DIM] = ["x", "xp", "y", "yp", "l", "dpp"];

/// Writes every `stride`-th particle of the final batch, one `.npy` file
/// per coordinate.
pub(crate) fn save_batch(batch: &ParticleBatch, outdir: &str, stride: usize) -> Result<()> {
    std::fs::create_dir_all(outdir).context("Unable to create output directory")?;
    for (coordinate, name) in COLUMN_NAMES.iter().enumerate() {
        let column: Vec<Float> = batch
            .rows()
            .step_by(stride)
            .map(|row| row[coordinate])
            .collect();
        npy::to_file(format!("{}/{}.npy", outdir, name), column)
            .context(format!("Could not save {} data to file", name))?;
    }
    Ok(())
}

/// Writes the per-element means, RMS sizes and loss counts.
pub(crate) fn save_statistics(stats: &BeamStatistics, outdir: &str) -> Result<()> {
    std::fs::create_dir_all(outdir).context("Unable to create output directory")?;
    let records = stats.records();
    for (coordinate, name) in COLUMN_NAMES.iter().enumerate() {
        let mean: Vec<Float> = records.iter().map(|r| r.mean[coordinate]).collect();
        npy::to_file(format!("{}/mean_{}.npy", outdir, name), mean)
            .context(format!("Could not save mean {} data to file", name))?;
        let sigma: Vec<Float> = records.iter().map(|r| r.sigma[coordinate]).collect();
        npy::to_file(format!("{}/sigma_{}.npy", outdir, name), sigma)
            .context(format!("Could not save sigma {} data to file", name))?;
    }
    let lost: Vec<u64> = records.iter().map(|r| r.lost as u64).collect();
    npy::to_file(format!("{}/lost.npy", outdir), lost).context("Could not save loss counts")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagator::Observer;

    #[test]
    fn writes_one_file_per_column() {
        let dir = std::env::temp_dir().join(format!("beamline_rs_save_{}", std::process::id()));
        let outdir = dir.to_str().unwrap();
        let batch = ParticleBatch::gaussian(10, &[1.0; DIM], Some(5));
        save_batch(&batch, outdir, 3).unwrap();

        let mut stats = BeamStatistics::new();
        stats.observe(0, &batch);
        save_statistics(&stats, outdir).unwrap();

        for name in COLUMN_NAMES.iter() {
            assert!(dir.join(format!("{}.npy", name)).exists());
            assert!(dir.join(format!("mean_{}.npy", name)).exists());
            assert!(dir.join(format!("sigma_{}.npy", name)).exists());
        }
        assert!(dir.join("lost.npy").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
