use chrono::{DateTime, Datelike, Utc};
use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderErrorReason,
    handlebars_helper,
};

handlebars_helper!(upper: |s: str| s.to_uppercase());
handlebars_helper!(lower: |s: str| s.to_lowercase());

/// Register the helpers available to every section.
pub fn register_helpers(handlebars: &mut Handlebars<'_>) {
    handlebars.register_helper("upper", Box::new(upper));
    handlebars.register_helper("lower", Box::new(lower));
    handlebars.register_helper("year", Box::new(year_helper));
    handlebars.register_helper("format_date", Box::new(format_date_helper));
}

/// Current UTC year, for copyright lines and the like.
fn year_helper(
    _: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&Utc::now().year().to_string())?;
    Ok(())
}

/// `{{format_date value "%B %-d, %Y"}}` where `value` is an RFC 3339 timestamp.
fn format_date_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("format_date", 0))?
        .value()
        .as_str()
        .ok_or(RenderErrorReason::InvalidParamType("string"))?;
    let format = h
        .param(1)
        .and_then(|p| p.value().as_str())
        .unwrap_or("%Y-%m-%d");

    let parsed = DateTime::parse_from_rfc3339(value)
        .map_err(|e| RenderErrorReason::Other(format!("invalid date '{value}': {e}")))?;
    out.write(&parsed.with_timezone(&Utc).format(format).to_string())?;
    Ok(())
}
