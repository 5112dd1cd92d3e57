/*!
# Saving Chain Histories to CSV

Writes a sampler history to a CSV file for an external reporting tool. Enable via the
`csv` feature.
*/

use ndarray::{Array2, Axis};
use std::error::Error;
use std::fs::File;

use csv::Writer;

/**
Saves a chain history as a CSV file.

The data is expected to be in a shape of **sample × coordinate**, as returned by
`history_array()` or [`crate::core::run_chain`].

The resulting CSV file will have:
- A header row containing `"sample"` followed by one column per coordinate. Columns take
  their names from `names`, or `"dim_0"`, `"dim_1"`, ... when `names` is empty.
- One row per sample.

# Examples

```rust
use mini_mc::io::csv::save_csv;
use ndarray::arr2;

let history = arr2(&[[2.1, 0.3], [1.9, 0.35]]);
let file = tempfile::NamedTempFile::new()?;
save_csv(&history, &["lambda", "p"], file.path().to_str().unwrap())?;
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/
pub fn save_csv(data: &Array2<f64>, names: &[&str], filename: &str) -> Result<(), Box<dyn Error>> {
    let n_dims = data.ncols();
    if !names.is_empty() && names.len() != n_dims {
        return Err(format!(
            "{} column names given for {} coordinates",
            names.len(),
            n_dims
        )
        .into());
    }

    let mut wtr = Writer::from_writer(File::create(filename)?);

    let mut header = vec!["sample".to_string()];
    if names.is_empty() {
        header.extend((0..n_dims).map(|i| format!("dim_{}", i)));
    } else {
        header.extend(names.iter().map(|n| n.to_string()));
    }
    wtr.write_record(&header)?;

    for (sample_idx, sample) in data.axis_iter(Axis(0)).enumerate() {
        let mut row = vec![sample_idx.to_string()];
        row.extend(sample.iter().map(|v| v.to_string()));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
