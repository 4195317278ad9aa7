use kmc2::*;
use rand::prelude::*;

fn main() {
    env_logger::init();
    let (sample_cnt, sample_dims, k) = (20000, 16, 32);

    // Generate some random data
    let mut rnd = StdRng::seed_from_u64(1337);
    let samples: Vec<f64> = (0..sample_cnt * sample_dims).map(|_| rnd.gen()).collect();
    let seeder = Seeder::new(&samples, sample_cnt, sample_dims, EuclideanDistance).expect("valid dataset");

    let methods: [(&str, fn(&Seeder<f64>, &mut CenterBuilder<f64>, &SeedingConfig<'_, f64>) -> Result<()>); 4] = [
        ("k-means++", Seeder::init_kmeanplusplus),
        ("kmc2", Seeder::init_kmc2),
        ("afkmc2", Seeder::init_afkmc2),
        ("afkmc2 (memoized)", Seeder::init_afkmc2_memoized),
    ];
    for (name, method) in methods {
        let conf = SeedingConfig::build().random_generator(StdRng::seed_from_u64(42)).build();
        let started = std::time::Instant::now();
        match seeder.seed(k, method, &conf) {
            Ok(centers) => println!("{:<20} {:>10.3?}  quantization error: {:.2}",
                name, started.elapsed(), seeder.quantization_error(&centers)),
            Err(err) => println!("{:<20} failed: {}", name, err),
        }
    }
}
