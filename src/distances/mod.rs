mod euclideandistance;

pub use euclideandistance::EuclideanDistance;
