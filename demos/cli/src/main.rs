use anyhow::{bail, Context};
use clap::Parser;
use growth_core::{Gender, GrowthConfig, Metric};
use growth_percentile::{age_in_days, build_growth_curves, classify_value, format_age};

#[derive(Parser, Debug)]
#[command(
    name = "growth-cli",
    about = "Tra cứu đường cong tham chiếu và phân loại bách phân vị tăng trưởng."
)]
struct Args {
    /// Giới tính: male hoặc female.
    #[arg(short, long)]
    gender: String,

    /// Chỉ số cần phân loại: weight, height, head.
    #[arg(short, long)]
    metric: Option<String>,

    /// Giá trị đo (kg hoặc cm).
    #[arg(short, long)]
    value: Option<f64>,

    /// Tuổi thô (đơn vị suy luận: <3 năm, <=24 tháng, còn lại là ngày).
    #[arg(short, long)]
    age: Option<String>,

    /// In toàn bộ đường cong dưới dạng JSON thay vì bản tóm tắt.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let gender = parse_gender(&args.gender)?;
    let config = GrowthConfig::default();
    let curves = build_growth_curves(gender, &config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&curves)?);
    } else {
        println!(
            "Reference curves ({} months): weight {} pts, height {} pts, head {} pts",
            config.curve_months,
            curves.weight.p50.len(),
            curves.height.p50.len(),
            curves.head_circumference.p50.len()
        );
    }

    if let (Some(metric), Some(value), Some(raw_age)) = (&args.metric, args.value, &args.age) {
        let metric = parse_metric(metric)?;
        let days =
            age_in_days(raw_age).with_context(|| format!("Không đọc được tuổi {raw_age:?}"))?;

        match classify_value(value, days, metric, gender) {
            Some(percentile) => println!(
                "Age {} -> percentile {}",
                format_age(days),
                percentile.value()
            ),
            None => println!("Age {} -> no reference data", format_age(days)),
        }
    }

    Ok(())
}

fn parse_gender(raw: &str) -> anyhow::Result<Gender> {
    match raw {
        "male" => Ok(Gender::Male),
        "female" => Ok(Gender::Female),
        other => bail!("Giới tính không hợp lệ: {other}"),
    }
}

fn parse_metric(raw: &str) -> anyhow::Result<Metric> {
    match raw {
        "weight" => Ok(Metric::Weight),
        "height" => Ok(Metric::Height),
        "head" => Ok(Metric::HeadCircumference),
        other => bail!("Chỉ số không hợp lệ: {other}"),
    }
}
