//! Built-in sorting algorithms that report every step to an observer, used
//! by the `demo` subcommand to drive the engine without a trace file.

use clap::ValueEnum;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Algorithm {
    Bubble,
    Cocktail,
    Insertion,
    Quick,
}

impl Algorithm {
    pub fn title(self) -> &'static str {
        match self {
            Algorithm::Bubble => "Bubble Sort",
            Algorithm::Cocktail => "Cocktail Shaker Sort",
            Algorithm::Insertion => "Insertion Sort",
            Algorithm::Quick => "Quick Sort",
        }
    }

    /// Sorts `values` in place. `step` receives the array after every pass
    /// and whether the pass walked right to left.
    pub fn run<F>(self, values: &mut [u32], mut step: F)
    where
        F: FnMut(&[u32], bool),
    {
        match self {
            Algorithm::Bubble => bubble(values, &mut step),
            Algorithm::Cocktail => cocktail(values, &mut step),
            Algorithm::Insertion => insertion(values, &mut step),
            Algorithm::Quick => {
                if !values.is_empty() {
                    let high = values.len() - 1;
                    quick(values, 0, high, &mut step);
                }
            }
        }
    }
}

/// `len` values drawn from `[low, high)`, reproducible when `seed` is set.
pub fn random_values(len: usize, low: u32, high: u32, seed: Option<u64>) -> Vec<u32> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut values: Vec<u32> = (0..len).map(|_| rng.random_range(low..high)).collect();
    values.shuffle(&mut rng);
    values
}

fn bubble(values: &mut [u32], step: &mut impl FnMut(&[u32], bool)) {
    let n = values.len();
    for i in 0..n {
        let mut swapped = false;
        for j in 0..n - i - 1 {
            if values[j] > values[j + 1] {
                values.swap(j, j + 1);
                swapped = true;
            }
        }
        step(values, false);
        if !swapped {
            break;
        }
    }
}

fn cocktail(values: &mut [u32], step: &mut impl FnMut(&[u32], bool)) {
    let n = values.len();
    if n < 2 {
        return;
    }
    loop {
        let mut swapped = false;
        for i in 0..n - 1 {
            if values[i] > values[i + 1] {
                values.swap(i, i + 1);
                swapped = true;
            }
        }
        step(values, false);
        if !swapped {
            break;
        }

        swapped = false;
        for i in (0..n - 1).rev() {
            if values[i] > values[i + 1] {
                values.swap(i, i + 1);
                swapped = true;
            }
        }
        step(values, true);
        if !swapped {
            break;
        }
    }
}

fn insertion(values: &mut [u32], step: &mut impl FnMut(&[u32], bool)) {
    for i in 1..values.len() {
        let key = values[i];
        let mut j = i;
        while j > 0 && values[j - 1] > key {
            values[j] = values[j - 1];
            j -= 1;
        }
        values[j] = key;
        step(values, false);
    }
}

fn quick(values: &mut [u32], low: usize, high: usize, step: &mut impl FnMut(&[u32], bool)) {
    if low >= high {
        return;
    }
    let pivot = partition(values, low, high);
    step(values, false);
    if pivot > low {
        quick(values, low, pivot - 1, step);
    }
    quick(values, pivot + 1, high, step);
}

/// Lomuto partition around `values[high]`.
fn partition(values: &mut [u32], low: usize, high: usize) -> usize {
    let pivot = values[high];
    let mut store = low;
    for j in low..high {
        if values[j] < pivot {
            values.swap(store, j);
            store += 1;
        }
    }
    values.swap(store, high);
    store
}
