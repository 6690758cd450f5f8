/*!
# Pricewise API documentation

This page describes the API endpoints available on Pricewise.

## Search

Endpoint: `/api/search`

Example: `/api/search?keyword=usb%20c%20cable&max_price=500&min_rating=4`

Searches Google Shopping (through SerpApi) for products, drops results that
don't fit the requested bounds, and ranks the rest by value for money.

### Query Parameters

- `keyword` - Required. What to search for.
- `max_price` - Required. The highest acceptable price, inclusive.
- `min_price` - Optional, defaults to `0`. The lowest acceptable price,
  inclusive.
- `min_rating` - Optional, defaults to `0`. The lowest acceptable rating,
  inclusive.

Empty parameters are treated as missing. If a parameter is repeated, its first
value is used. Other parameters are ignored.

### Response

A JSON array of results, best value first:

- `name` - The product title.
- `source` - The shop selling the product.
- `price` - The price. Always greater than zero, and within the requested bounds.
- `rating` - The product rating, usually 0 to 5. Unrated products have a
  rating of `0`.
- `link` - A link to the product.
- `thumbnail` - A link to an image of the product.
- `value_score` - `rating / price`. Results are sorted by this, highest first.
  The order of results with equal scores is not guaranteed.

Text fields that the upstream provider didn't supply are left out. Numbers or
booleans given for a text field are reported as text, and lists or objects are
left out. Products
whose price is missing or can't be read are never returned.

### Errors

Errors are reported as a JSON object with a single `error` field.

- `400` - `keyword` or `max_price` is missing, the server has no SerpApi key,
  or a numeric parameter isn't a number.
- `500` - SerpApi could not be reached, responded with an error, or responded
  with something other than shopping results. The message describes the cause.
  A response containing a number too large to represent, such as `1e400`, is
  reported as malformed, even if the number is in a field Pricewise would
  otherwise ignore.

## Validate

Endpoint: `/api/validate`

Returns the operator's configured phone number, as `{ "number": "..." }`. Any
query parameters are ignored.

## Dockerflow

- `/__lbheartbeat__` - An empty `200` response.
- `/__heartbeat__` - The version, and whether a SerpApi key is configured.
- `/__version__` - The contents of `version.json`.
*/
