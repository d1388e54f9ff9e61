//! Compositional Grammar parser, built with `nom` combinators in the same
//! style as a hand-written recursive-descent ECL parser: small leaf
//! combinators composed bottom-up, with `all_consuming` at the entry point
//! so trailing garbage is a parse error rather than silently ignored.

use crate::ast::{Clause, ConceptRef, DefinitionStatus, Expression, Refinement, Value};
use crate::error::{ExprError, ExprResult};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, map, map_res, opt, recognize},
    multi::separated_list1,
    sequence::{delimited, pair, preceded, separated_pair},
    IResult,
};

/// Parses a Compositional Grammar expression string into its canonical tree.
pub fn parse(input: &str) -> ExprResult<Expression> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ExprError::EmptyExpression);
    }

    match all_consuming(expression)(trimmed) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = trimmed.len() - e.input.len();
            Err(ExprError::ParseError {
                position,
                message: format!("unexpected input at: '{}'", truncate(e.input, 24)),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(ExprError::ParseError {
            position: trimmed.len(),
            message: "incomplete expression".to_string(),
        }),
    }
}

fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        &s[..max_len]
    }
}

fn ws(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}

fn expression(input: &str) -> IResult<&str, Expression> {
    let (input, _) = ws(input)?;
    let (input, status) = opt(alt((
        map(tag("==="), |_| DefinitionStatus::Equivalent),
        map(tag("<<<"), |_| DefinitionStatus::Subtype),
    )))(input)?;
    let (input, _) = ws(input)?;
    let (input, clause) = clause(input)?;
    let (input, _) = ws(input)?;
    Ok((
        input,
        Expression {
            definition_status: status.unwrap_or(DefinitionStatus::Equivalent),
            clause,
        },
    ))
}

fn clause(input: &str) -> IResult<&str, Clause> {
    let (input, focus_concepts) = focus_concepts(input)?;
    let (input, _) = ws(input)?;
    let (input, refinement_section) = opt(preceded(
        pair(char(':'), ws),
        separated_list1(refinement_separator, refinement_or_group),
    ))(input)?;

    let mut refinements = Vec::new();
    let mut groups = Vec::new();
    for item in refinement_section.unwrap_or_default() {
        match item {
            RefinementOrGroup::Single(r) => refinements.push(r),
            RefinementOrGroup::Group(g) => groups.push(g),
        }
    }

    Ok((
        input,
        Clause {
            focus_concepts,
            refinements,
            groups,
        },
    ))
}

fn refinement_separator(input: &str) -> IResult<&str, char> {
    delimited(ws, char(','), ws)(input)
}

enum RefinementOrGroup {
    Single(Refinement),
    Group(Vec<Refinement>),
}

fn refinement_or_group(input: &str) -> IResult<&str, RefinementOrGroup> {
    alt((
        map(group, RefinementOrGroup::Group),
        map(refinement, RefinementOrGroup::Single),
    ))(input)
}

fn group(input: &str) -> IResult<&str, Vec<Refinement>> {
    delimited(
        pair(char('{'), ws),
        separated_list1(refinement_separator, refinement),
        pair(ws, char('}')),
    )(input)
}

fn refinement(input: &str) -> IResult<&str, Refinement> {
    let (input, (attribute, value)) = separated_pair(
        concept_ref,
        delimited(ws, char('='), ws),
        value,
    )(input)?;
    Ok((input, Refinement { attribute, value }))
}

fn focus_concepts(input: &str) -> IResult<&str, Vec<ConceptRef>> {
    separated_list1(delimited(ws, char('+'), ws), concept_ref)(input)
}

fn value(input: &str) -> IResult<&str, Value> {
    alt((
        map(nested_clause, |c| Value::Nested(Box::new(c))),
        map(decimal_literal, Value::Decimal),
        map(integer_literal, Value::Integer),
        map(quoted_string, Value::String),
        map(concept_ref, Value::Concept),
    ))(input)
}

fn nested_clause(input: &str) -> IResult<&str, Clause> {
    delimited(
        pair(char('('), ws),
        clause,
        pair(ws, char(')')),
    )(input)
}

fn integer_literal(input: &str) -> IResult<&str, i64> {
    map_res(preceded(char('#'), recognize(pair(opt(char('-')), digit1))), |s: &str| {
        s.parse::<i64>()
    })(input)
}

fn decimal_literal(input: &str) -> IResult<&str, String> {
    map(
        preceded(
            char('#'),
            recognize(pair(pair(opt(char('-')), digit1), pair(char('.'), digit1))),
        ),
        |s: &str| s.to_string(),
    )(input)
}

fn quoted_string(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_until("\""), char('"')),
        |s: &str| s.to_string(),
    )(input)
}

fn concept_ref(input: &str) -> IResult<&str, ConceptRef> {
    let (input, id_str) = digit1(input)?;
    let concept_id = id_str.parse().unwrap_or(0);
    let (input, _) = ws(input)?;
    let (input, term) = opt(delimited(char('|'), take_while(|c| c != '|'), char('|')))(input)?;
    Ok((
        input,
        ConceptRef {
            concept_id,
            term: term.map(|t: &str| t.trim().to_string()),
        },
    ))
}

#[allow(dead_code)]
fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric())(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_bare_concept_reference() {
        let expr = parse("64572001").unwrap();
        assert_eq!(expr.clause.focus_concepts.len(), 1);
        assert_eq!(expr.clause.focus_concepts[0].concept_id, 64572001);
        assert!(expr.clause.refinements.is_empty());
    }

    #[test]
    fn parses_focus_concepts_with_terms_and_two_refinements() {
        let expr = parse(
            "64572001 |disease|: 246454002 |occurrence| = 255407002 |neonatal|, \
             363698007 |finding site| = 113257007 |structure of cardiovascular system|",
        )
        .unwrap();

        assert_eq!(expr.clause.focus_concepts[0].concept_id, 64572001);
        assert_eq!(
            expr.clause.focus_concepts[0].term.as_deref(),
            Some("disease")
        );
        assert_eq!(expr.clause.refinements.len(), 2);
        assert_eq!(expr.clause.refinements[0].attribute.concept_id, 246454002);
    }

    #[test]
    fn parses_multiple_focus_concepts() {
        let expr = parse("64572001 + 73211009").unwrap();
        assert_eq!(expr.clause.focus_concepts.len(), 2);
        assert_eq!(expr.clause.focus_concepts[1].concept_id, 73211009);
    }

    #[test]
    fn parses_a_subtype_prefix() {
        let expr = parse("<<< 64572001").unwrap();
        assert_eq!(expr.definition_status, DefinitionStatus::Subtype);
    }

    #[test]
    fn parses_a_group() {
        let expr = parse("71388002: { 260686004 = 129304002, 405813007 = 15497006 }").unwrap();
        assert_eq!(expr.clause.groups.len(), 1);
        assert_eq!(expr.clause.groups[0].len(), 2);
    }

    #[test]
    fn parses_nested_sub_expression_values() {
        let expr = parse("71388002: 405813007 = (64572001: 246454002 = 255407002)").unwrap();
        match &expr.clause.refinements[0].value {
            Value::Nested(nested) => {
                assert_eq!(nested.focus_concepts[0].concept_id, 64572001);
            }
            other => panic!("expected nested clause, got {other:?}"),
        }
    }

    #[test]
    fn parses_integer_and_decimal_and_string_values() {
        let expr = parse(r#"71388002: 246199003 = #500, 246200005 = #1.5, 246201006 = "batch-9""#)
            .unwrap();
        assert_eq!(expr.clause.refinements[0].value, Value::Integer(500));
        assert_eq!(
            expr.clause.refinements[1].value,
            Value::Decimal("1.5".to_string())
        );
        assert_eq!(
            expr.clause.refinements[2].value,
            Value::String("batch-9".to_string())
        );
    }

    #[test]
    fn rejects_trailing_garbage() {
        let err = parse("64572001 garbage").unwrap_err();
        assert!(matches!(err, ExprError::ParseError { .. }));
    }

    #[test]
    fn rejects_empty_input() {
        let err = parse("   ").unwrap_err();
        assert_eq!(err, ExprError::EmptyExpression);
    }
}
